use proptest::prelude::*;
use tmkb::scoring::{MAX_NGRAM, extract_ngrams};
use tmkb::*;

fn expected_raw_count(words: usize) -> usize {
    (1..=MAX_NGRAM.min(words)).map(|n| words - n + 1).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn never_panics(text in any::<String>()) {
        let _ = extract_keywords(&text);
    }

    #[test]
    fn no_ngram_longer_than_three_words(text in "[a-zA-Z ]{0,80}") {
        for keyword in extract_keywords(&text) {
            prop_assert!(keyword.split(' ').count() <= MAX_NGRAM, "{:?}", keyword);
        }
    }

    #[test]
    fn raw_count_matches_window_sum(words in prop::collection::vec("[a-z]{1,8}", 0..20)) {
        let text = words.join(" ");
        prop_assert_eq!(extract_ngrams(&text).len(), expected_raw_count(words.len()));
    }

    #[test]
    fn whitespace_layout_is_irrelevant(
        words in prop::collection::vec("[a-z]{1,8}", 0..10),
        sep in "[ \t\n]{1,4}",
    ) {
        prop_assert_eq!(
            extract_keywords(&words.join(&sep)),
            extract_keywords(&words.join(" "))
        );
    }

    #[test]
    fn keywords_are_lower_case(text in "[a-zA-Z ]{0,60}") {
        for keyword in extract_keywords(&text) {
            prop_assert_eq!(keyword.clone(), keyword.to_lowercase());
        }
    }
}
