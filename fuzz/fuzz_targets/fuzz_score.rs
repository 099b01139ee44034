#![no_main]

use libfuzzer_sys::fuzz_target;
use tmkb::calculate_relevance;

fuzz_target!(|input: (Vec<String>, Vec<String>)| {
    let (query, pattern) = input;
    let score = calculate_relevance(query.as_slice(), pattern.as_slice());
    assert!(score.is_finite());
    assert!(score >= 0.0);
});
