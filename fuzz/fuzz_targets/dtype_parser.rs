#![no_main]

use framehouse_core::TypeDescriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Anything that parses must print back to text that parses to the same layout
    if let Ok(dtype) = TypeDescriptor::parse(text) {
        let canonical = dtype.to_string();
        let reparsed = TypeDescriptor::parse(&canonical).expect("canonical text must parse");
        assert_eq!(reparsed, dtype);
        let _ = dtype.offsets();
    }
});
