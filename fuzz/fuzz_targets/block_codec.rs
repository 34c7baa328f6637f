#![no_main]

use framehouse_core::Compression;
use framehouse_storage::block;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary stored blocks must fail cleanly, never panic or over-allocate
    let _ = block::declared_len(data);
    let _ = block::decompress(data, Compression::Lz4);
    let _ = block::decompress(data, Compression::None);

    for compression in [Compression::Lz4, Compression::None] {
        let packed = block::compress(data, compression).expect("compress");
        let unpacked = block::decompress(&packed, compression).expect("decompress");
        assert_eq!(unpacked, data);
    }
});
