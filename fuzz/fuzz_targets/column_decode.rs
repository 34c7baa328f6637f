#![no_main]

use framehouse_core::{ColumnCodec, TypeDescriptor};
use libfuzzer_sys::fuzz_target;

const DTYPE: &str = "[('ts', '<M8[ns]'), ('px', '>f8'), ('qty', '<i4'), ('venue', '<S4'), ('name', '<U2')]";

fuzz_target!(|data: &[u8]| {
    let Ok(dtype) = TypeDescriptor::parse(DTYPE) else {
        return;
    };

    // First byte picks the claimed row count; the rest is the payload
    let Some((&rows, payload)) = data.split_first() else {
        return;
    };

    if let Ok(df) = ColumnCodec::decode(payload, &dtype, rows as usize) {
        assert_eq!(df.columns().len(), dtype.fields().len());
        assert!(df.columns().iter().all(|c| c.len() == rows as usize));
    }
});
