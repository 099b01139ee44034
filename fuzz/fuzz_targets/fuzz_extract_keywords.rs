#![no_main]

use libfuzzer_sys::fuzz_target;
use tmkb::scoring::{MAX_NGRAM, extract_keywords};

fuzz_target!(|data: &str| {
    for keyword in extract_keywords(data) {
        assert!(!keyword.is_empty());
        assert!(keyword.split(' ').count() <= MAX_NGRAM);
    }
});
