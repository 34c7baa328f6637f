//! SHA-256 hashes for version and segment documents.
//!
//! - **Content hash**: SHA-256 of the first encoded (uncompressed) payload of a
//!   chain, stored on the version document and carried by later appends
//! - **Segment hash**: SHA-256 over a segment's canonical fields, sorted by
//!   name (`compressed`, `data`, `segment`, `symbol`). Each field contributes
//!   its name, its value length as u64 LE, then its value bytes.
//!
//! Hashes are stored hex encoded.

use framehouse_metadata::SegmentDoc;
use sha2::{Digest, Sha256};

pub fn content_hash(encoded: &[u8]) -> String {
    hex::encode(Sha256::digest(encoded))
}

pub fn segment_hash(segment: &SegmentDoc) -> String {
    let mut hasher = Sha256::new();
    put_field(&mut hasher, "compressed", &[u8::from(segment.compressed)]);
    put_field(&mut hasher, "data", &segment.data);
    put_field(&mut hasher, "segment", &segment.segment.to_le_bytes());
    put_field(&mut hasher, "symbol", segment.symbol.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_segment(segment: &SegmentDoc) -> bool {
    segment_hash(segment) == segment.sha
}

fn put_field(hasher: &mut Sha256, name: &str, value: &[u8]) {
    hasher.update(name.as_bytes());
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn segment() -> SegmentDoc {
        let mut segment = SegmentDoc {
            id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            data: vec![1, 2, 3, 4],
            compressed: true,
            segment: 99,
            parent: vec![Uuid::new_v4()],
            sha: String::new(),
        };
        segment.sha = segment_hash(&segment);
        segment
    }

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_segment_hash_covers_fields() {
        let original = segment();
        assert!(verify_segment(&original));

        let mut tampered = original.clone();
        tampered.data[0] ^= 0xff;
        assert!(!verify_segment(&tampered));

        let mut tampered = original.clone();
        tampered.segment += 1;
        assert!(!verify_segment(&tampered));

        let mut tampered = original.clone();
        tampered.compressed = false;
        assert!(!verify_segment(&tampered));

        let mut tampered = original.clone();
        tampered.symbol = "MSFT".to_string();
        assert!(!verify_segment(&tampered));
    }

    #[test]
    fn test_segment_hash_ignores_links() {
        let original = segment();
        let mut relinked = original.clone();
        relinked.id = Uuid::new_v4();
        relinked.parent.push(Uuid::new_v4());
        assert_eq!(segment_hash(&relinked), original.sha);
    }
}
