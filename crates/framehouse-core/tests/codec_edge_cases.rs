//! Edge-case tests for the descriptor language and the row-major codec.

use chrono::{TimeZone, Utc};
use framehouse_core::{
    Column, ColumnCodec, Dataframe, Endian, Error, Scalar, ScalarKind, TypeDescriptor, Value,
};

// ---------------------------------------------------------------
// Descriptor parsing
// ---------------------------------------------------------------

#[test]
fn parse_display_parse_is_stable_for_records() {
    let texts = [
        "[('Open', '<f8'), ('Volume', '<i8')]",
        "[('ts', 'M8[ns]'), ('sym', 'S8'), ('venue', '>U4')]",
        "[('a', '=i4')]",
        "[('outer', [('inner', '<f8'), ('n', '<i4')]), ('tail', 'S1')]",
    ];
    for text in texts {
        let parsed = TypeDescriptor::parse(text).unwrap();
        let reparsed = TypeDescriptor::parse(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed, "roundtrip of {text}");
    }
}

#[test]
fn unicode_width_is_four_bytes_per_char() {
    let dtype = TypeDescriptor::parse("[('a', '<U10'), ('b', 'S10')]").unwrap();
    assert_eq!(dtype.itemsize(), 50);
    assert_eq!(dtype.field_offset(1), Some(40));
}

#[test]
fn malformed_descriptors_fail_with_position() {
    let cases = [
        ("", 0),
        ("[", 1),
        ("[]", 1),
        ("[('a' '<f8')]", 6),
        ("[('a', '<x8')]", 9),
        ("[('a', '<f8'", 12),
        ("'<S'", 3),
    ];
    for (text, expected_position) in cases {
        match TypeDescriptor::parse(text) {
            Err(Error::Parse { position, .. }) => {
                assert_eq!(position, expected_position, "position for {text:?}")
            }
            other => panic!("expected parse error for {text:?}, got {other:?}"),
        }
    }
}

#[test]
fn parse_error_message_names_expected_token() {
    let err = TypeDescriptor::parse("[('a', '<f8') ('b', '<f8')]").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("position 14"), "{message}");
    assert!(message.contains("',' or ']'"), "{message}");
}

// ---------------------------------------------------------------
// Codec round trips
// ---------------------------------------------------------------

#[test]
fn roundtrip_wide_frame() {
    let rows = 1_000;
    let df = Dataframe::new(vec![
        Column::datetime_ns("ts", (0..rows).map(|i| i * 1_000).collect()),
        Column::float64("bid", (0..rows).map(|i| i as f64 * 0.25).collect()),
        Column::float64("ask", (0..rows).map(|i| i as f64 * 0.25 + 0.01).collect()),
        Column::int64("size", (0..rows).map(|i| i * 100).collect()),
        Column::int32("flags", (0..rows).map(|i| (i % 7) as i32).collect()),
        Column::fixed_string("sym", 6, (0..rows).map(|i| format!("S{i}")).collect()),
    ])
    .unwrap();

    let bytes = ColumnCodec::encode(&df).unwrap();
    assert_eq!(bytes.len(), rows as usize * (8 + 8 + 8 + 8 + 4 + 6));

    let back = ColumnCodec::decode(&bytes, &df.dtype(), rows as usize).unwrap();
    assert_eq!(back, df);
}

#[test]
fn decode_zero_rows() {
    let dtype = TypeDescriptor::parse("[('a', '<f8')]").unwrap();
    let df = ColumnCodec::decode(&[], &dtype, 0).unwrap();
    assert_eq!(df.len(), 0);
    assert_eq!(df.column_names(), vec!["a".to_string()]);
}

#[test]
fn decode_with_text_descriptor_byte_orders() {
    let le = TypeDescriptor::parse("[('u', '<U2')]").unwrap();
    let be = TypeDescriptor::parse("[('u', '>U2')]").unwrap();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&u32::from('h').to_be_bytes());
    bytes.extend_from_slice(&u32::from('i').to_be_bytes());

    let from_be = ColumnCodec::decode(&bytes, &be, 1).unwrap();
    assert_eq!(
        from_be.column("u").unwrap().get(0),
        Some(Value::Text("hi".to_string()))
    );

    let from_le = ColumnCodec::decode(&bytes, &le, 1).unwrap();
    assert_ne!(
        from_le.column("u").unwrap().get(0),
        Some(Value::Text("hi".to_string()))
    );
}

#[test]
fn datetime_column_survives_codec_as_calendar_time() {
    let ts = Utc.with_ymd_and_hms(2021, 6, 30, 16, 0, 0).unwrap();
    let df = Dataframe::new(vec![Column::datetimes("ts", &[ts]).unwrap()]).unwrap();

    let bytes = ColumnCodec::encode(&df).unwrap();
    let back = ColumnCodec::decode(&bytes, &df.dtype(), 1).unwrap();
    assert_eq!(back.column("ts").unwrap().datetime_at(0), Some(ts));
}

#[test]
fn native_order_column_matches_host_bytes() {
    let column = Column::new(
        "n",
        Scalar::new(ScalarKind::Int64, Endian::Native),
        framehouse_core::ColumnData::Int64(vec![42]),
    )
    .unwrap();
    let df = Dataframe::new(vec![column]).unwrap();
    assert_eq!(ColumnCodec::encode(&df).unwrap(), 42i64.to_ne_bytes().to_vec());
}
