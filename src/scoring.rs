//! Keyword extraction and relevance scoring.
//!
//! Both functions are total: any input, including empty or whitespace-only
//! text, produces a value and never panics.

use std::collections::BTreeSet;

/// Largest n-gram window produced by [`extract_ngrams`].
pub const MAX_NGRAM: usize = 3;

/// Every contiguous 1-, 2- and 3-word window of `text`, lower-cased, before
/// de-duplication.
///
/// For `w` words the result holds `Σ_{n=1}^{min(3,w)} (w - n + 1)` entries,
/// ordered by window size and then position.
pub fn extract_ngrams(text: &str) -> Vec<String> {
    let lowered = text.trim().to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut ngrams = Vec::new();
    for n in 1..=MAX_NGRAM.min(words.len()) {
        for window in words.windows(n) {
            ngrams.push(window.join(" "));
        }
    }
    ngrams
}

/// Normalized keyword set for free text: the de-duplicated n-grams.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    extract_ngrams(text).into_iter().collect()
}

/// Number of distinct keywords shared by both sides, ignoring case.
pub fn match_count<Q, P>(query_keywords: &[Q], pattern_keywords: &[P]) -> usize
where
    Q: AsRef<str>,
    P: AsRef<str>,
{
    overlap(query_keywords, &lowered_set(pattern_keywords))
}

/// Hybrid relevance: `2·matches + matches / |pattern keywords|`.
///
/// The overlap term dominates: each additional match adds 2.0 while the
/// coverage term contributes at most 1.0, so a pattern matching more distinct
/// query terms always outranks one matching fewer. Returns 0.0 when either
/// side is empty or nothing matches. Both sides use set semantics on the
/// lower-cased keywords.
pub fn calculate_relevance<Q, P>(query_keywords: &[Q], pattern_keywords: &[P]) -> f64
where
    Q: AsRef<str>,
    P: AsRef<str>,
{
    if query_keywords.is_empty() || pattern_keywords.is_empty() {
        return 0.0;
    }

    let pattern = lowered_set(pattern_keywords);
    let matches = overlap(query_keywords, &pattern);
    if matches == 0 {
        return 0.0;
    }

    let match_weight = matches as f64 * 2.0;
    let coverage = matches as f64 / pattern.len() as f64;
    match_weight + coverage
}

/// Distinct lower-cased query keywords present in `pattern`.
fn overlap<Q: AsRef<str>>(query_keywords: &[Q], pattern: &BTreeSet<String>) -> usize {
    lowered_set(query_keywords)
        .iter()
        .filter(|k| pattern.contains(*k))
        .count()
}

fn lowered_set<S: AsRef<str>>(keywords: &[S]) -> BTreeSet<String> {
    keywords.iter().map(|k| k.as_ref().to_lowercase()).collect()
}
