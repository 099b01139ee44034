use tmkb::scoring::{extract_ngrams, match_count};
use tmkb::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ─── Keyword extraction ─────────────────────────────────────────────────────

#[test]
fn extracts_unigrams_bigrams_and_trigrams() {
    let keywords = extract_keywords("Background Job Processing");
    let expected = [
        "background",
        "job",
        "processing",
        "background job",
        "job processing",
        "background job processing",
    ];
    assert_eq!(keywords.len(), expected.len());
    for k in expected {
        assert!(keywords.contains(k), "missing {:?} in {:?}", k, keywords);
    }
}

#[test]
fn never_produces_four_grams() {
    let keywords = extract_keywords("one two three four five");
    assert!(keywords.iter().all(|k| k.split(' ').count() <= 3));
    assert!(!keywords.contains("one two three four"));
}

#[test]
fn empty_and_whitespace_yield_nothing() {
    assert!(extract_keywords("").is_empty());
    assert!(extract_keywords("   \t\n  ").is_empty());
    assert!(extract_ngrams("").is_empty());
}

#[test]
fn collapses_irregular_whitespace() {
    let keywords = extract_keywords("  jwt \t  token\n");
    assert!(keywords.contains("jwt token"));
    assert_eq!(keywords.len(), 3);
}

#[test]
fn raw_ngrams_keep_duplicates() {
    // 3 words: 3 + 2 + 1 windows, "job" twice before de-duplication.
    let raw = extract_ngrams("job job job");
    assert_eq!(raw.len(), 6);
    assert_eq!(extract_keywords("job job job").len(), 3);
}

// ─── Relevance ──────────────────────────────────────────────────────────────

#[test]
fn two_of_two_matches_scores_five() {
    let query: Vec<String> = extract_keywords("background job processing").into_iter().collect();
    let score = calculate_relevance(query.as_slice(), &["background", "job"]);
    assert!(approx(score, 5.0), "got {}", score);

    let other = calculate_relevance(query.as_slice(), &["tenant", "isolation"]);
    assert!(approx(other, 0.0));
}

#[test]
fn matching_ignores_case() {
    let score = calculate_relevance(&["jwt", "validation"], &["JWT", "Authorization"]);
    assert_eq!(match_count(&["jwt", "validation"], &["JWT", "Authorization"]), 1);
    assert!(approx(score, 2.5), "got {}", score);
}

#[test]
fn more_matches_beat_better_coverage() {
    let query: Vec<String> = (0..10).map(|i| format!("k{}", i)).collect();

    let ten: Vec<String> = (0..3)
        .map(|i| format!("k{}", i))
        .chain((0..7).map(|i| format!("other{}", i)))
        .collect();
    let twenty: Vec<String> = (0..4)
        .map(|i| format!("k{}", i))
        .chain((0..16).map(|i| format!("other{}", i)))
        .collect();

    let three_of_ten = calculate_relevance(query.as_slice(), ten.as_slice());
    let four_of_twenty = calculate_relevance(query.as_slice(), twenty.as_slice());
    assert!(approx(three_of_ten, 6.3), "got {}", three_of_ten);
    assert!(approx(four_of_twenty, 8.2), "got {}", four_of_twenty);
    assert!(four_of_twenty > three_of_ten);
}

#[test]
fn empty_sides_score_zero() {
    let none: [&str; 0] = [];
    assert_eq!(calculate_relevance(&none, &["a"]), 0.0);
    assert_eq!(calculate_relevance(&["a"], &none), 0.0);
    assert_eq!(calculate_relevance(&none, &none), 0.0);
}

#[test]
fn duplicate_pattern_keywords_count_once() {
    // {"jwt"} after lower-casing: one match out of one distinct keyword.
    let score = calculate_relevance(&["jwt"], &["jwt", "JWT"]);
    assert!(approx(score, 3.0), "got {}", score);
}
