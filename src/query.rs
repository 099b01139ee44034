//! Match, filter and rank pipeline.
//!
//! [`rank`] is state-free: one pass per call over a shared [`Index`]. Two
//! calls with identical inputs produce identical orderings because every
//! comparison ends in the unique pattern id.

use std::cmp::Ordering;

use crate::enums::{FrameworkFilter, Verbosity};
use crate::index::{Index, PatternRef};
use crate::scoring::{calculate_relevance, extract_keywords};
use crate::types::ThreatPattern;

/// Per-call query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Free-text description of the code being written. Blank means "every
    /// pattern, ranked by severity".
    pub context: String,
    pub language: Option<String>,
    pub framework: Option<FrameworkFilter>,
    pub category: Option<String>,
    /// Maximum patterns in the response; 0 selects the mode default.
    pub limit: usize,
    pub verbosity: Verbosity,
}

impl QueryOptions {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Self::default()
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn framework(mut self, framework: impl Into<FrameworkFilter>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Whether the context carries anything to match on.
    pub fn has_context(&self) -> bool {
        !self.context.trim().is_empty()
    }
}

/// Ordered candidates for `options`, before the result limit.
///
/// 1. Candidates come from [`Index::match_context`], or the whole collection
///    when the context is blank.
/// 2. Language, framework and category filters drop non-matching records.
///    An unknown filter value simply leaves nothing.
/// 3. With a context, candidates sort by relevance descending; ties (and
///    every comparison without a context) fall through severity, likelihood
///    and id.
pub fn rank(index: &Index, options: &QueryOptions) -> Vec<PatternRef> {
    let has_context = options.has_context();
    let mut candidates = if has_context {
        index.match_context(&options.context)
    } else {
        index.get_all()
    };

    if let Some(language) = &options.language {
        let language = language.to_lowercase();
        candidates.retain(|p| p.language.to_lowercase() == language);
    }
    if let Some(framework) = &options.framework {
        candidates.retain(|p| framework.matches(&p.framework));
    }
    if let Some(category) = &options.category {
        let category = category.to_lowercase();
        candidates.retain(|p| p.category.to_lowercase() == category);
    }

    if !has_context {
        candidates.sort_by(|a, b| tie_break(a, b));
        return candidates;
    }

    let query_keywords: Vec<String> = extract_keywords(&options.context).into_iter().collect();
    let mut scored: Vec<(f64, PatternRef)> = candidates
        .into_iter()
        .map(|p| (calculate_relevance(query_keywords.as_slice(), p.keywords()), p))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b.total_cmp(score_a).then_with(|| tie_break(a, b))
    });

    scored.into_iter().map(|(_, p)| p).collect()
}

/// Severity, then likelihood (most severe and most likely first), then id.
fn tie_break(a: &ThreatPattern, b: &ThreatPattern) -> Ordering {
    a.severity
        .rank()
        .cmp(&b.severity.rank())
        .then_with(|| a.likelihood.rank().cmp(&b.likelihood.rank()))
        .then_with(|| a.id.cmp(&b.id))
}
