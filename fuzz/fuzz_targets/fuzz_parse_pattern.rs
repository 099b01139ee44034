#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(pattern) = tmkb::parse_pattern(data) {
        let _ = tmkb::validate(&pattern);
    }
});
