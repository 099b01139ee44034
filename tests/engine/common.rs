use std::path::PathBuf;
use std::sync::Arc;

use tmkb::*;

/// Minimal tier B record with the given trigger keywords.
pub fn pattern(id: &str, keywords: &[&str]) -> ThreatPattern {
    ThreatPattern {
        id: id.to_string(),
        name: format!("Pattern {}", id),
        tier: Tier::B,
        version: String::new(),
        last_updated: String::new(),
        category: "authorization".to_string(),
        subcategory: String::new(),
        language: "python".to_string(),
        framework: "flask".to_string(),
        severity: Severity::High,
        likelihood: Likelihood::High,
        generalizes_to: vec![],
        provenance: Provenance::default(),
        triggers: Triggers {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Triggers::default()
        },
        differentiation: Differentiation::default(),
        description: format!("Description of {}", id),
        agent_summary: AgentSummary {
            threat: format!("{} threat", id),
            check: format!("{} check", id),
            fix: format!("{} fix", id),
        },
        attack_scenario: None,
        mitigations: vec![],
        security_principles: vec![],
        related_patterns: vec![],
        testing: None,
        validation: None,
    }
}

pub fn with_rank(mut p: ThreatPattern, severity: Severity, likelihood: Likelihood) -> ThreatPattern {
    p.severity = severity;
    p.likelihood = likelihood;
    p
}

/// The four-pattern authorization collection used across the query tests.
pub fn authz_collection() -> Vec<ThreatPattern> {
    vec![
        pattern(
            "TMKB-AUTHZ-001",
            &["background", "job", "celery", "async", "authorization"],
        ),
        with_rank(
            pattern(
                "TMKB-AUTHZ-002",
                &["tenant", "multi-tenant", "organization", "isolation"],
            ),
            Severity::Critical,
            Likelihood::High,
        ),
        with_rank(
            pattern("TMKB-AUTHZ-003", &["jwt", "token", "validation", "signature"]),
            Severity::Critical,
            Likelihood::Medium,
        ),
        pattern(
            "TMKB-AUTHZ-004",
            &["api", "endpoint", "route", "authorization", "permission"],
        ),
    ]
}

/// Engine with a deterministic token counter.
pub fn engine(patterns: Vec<ThreatPattern>) -> Engine {
    Engine::with_counter(patterns, EngineConfig::default(), Arc::new(ApproxTokenCounter))
}

pub fn index(patterns: Vec<ThreatPattern>) -> Index {
    Index::from_patterns(patterns)
}

pub fn ids(patterns: &[PatternRef]) -> Vec<&str> {
    patterns.iter().map(|p| p.id.as_str()).collect()
}

/// Charges the same cost for every serialized pattern.
pub struct FixedCounter(pub usize);

impl TokenCounter for FixedCounter {
    fn count(&self, _text: &str) -> usize {
        self.0
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/patterns")
}
