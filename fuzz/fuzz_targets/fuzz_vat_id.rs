#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Arbitrary strings, multi-byte included, must never panic.
        let _ = hlaseni::core::normalize_dic(s);
        let _ = hlaseni::core::validate_dic(s);
        let _ = hlaseni::core::validate_vat_format(s);
    }
});
