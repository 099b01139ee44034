//! Record lint pass.
//!
//! Returns **all** errors and warnings for a pattern, not just the first.
//! Validation never modifies a record and is independent of querying: the
//! engine accepts records that fail it.

use crate::enums::Tier;
use crate::error::*;
use crate::types::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// ─── Cached regexes ─────────────────────────────────────────────────────────

static PATTERN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]*(-[A-Z][A-Z0-9]*)*-[0-9]{3,}$").unwrap());

static CWE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^CWE-[0-9]+$").unwrap());

/// Summaries longer than this are likely to exceed ~100 tokens.
const SUMMARY_CHAR_LIMIT: usize = 400;

/// Lint a single pattern.
pub fn validate(pattern: &ThreatPattern) -> ValidationResult {
    let mut report = Report::new(pattern);

    required_fields(pattern, &mut report);
    agent_summary(pattern, &mut report);
    triggers(pattern, &mut report);
    mitigations(pattern, &mut report);
    id_format(pattern, &mut report);
    references(pattern, &mut report);
    provenance(pattern, &mut report);
    if pattern.tier == Tier::A {
        tier_a(pattern, &mut report);
    }

    report.finish()
}

/// Lint a whole collection: every per-pattern rule plus duplicate ids and
/// related-pattern references that point outside the collection.
pub fn validate_all(patterns: &[ThreatPattern]) -> Vec<ValidationResult> {
    let known: HashSet<&str> = patterns.iter().map(|p| p.id.as_str()).collect();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            let mut result = validate(pattern);

            if let Some(&first) = first_seen.get(pattern.id.as_str()) {
                result.errors.push(diagnostic(
                    DiagnosticSeverity::Error,
                    "duplicate-id",
                    "id",
                    format!("duplicates the id of pattern #{}", first + 1),
                ));
            } else {
                first_seen.insert(pattern.id.as_str(), i);
            }

            for (j, related) in pattern.related_patterns.iter().enumerate() {
                if !known.contains(related.id.as_str()) {
                    result.warnings.push(diagnostic(
                        DiagnosticSeverity::Warning,
                        "dangling-related-pattern",
                        &format!("related_patterns[{}].id", j),
                        format!("'{}' is not in the collection", related.id),
                    ));
                }
            }

            result
        })
        .collect()
}

// ─── Helper: accumulate findings ────────────────────────────────────────────

struct Report {
    result: ValidationResult,
}

impl Report {
    fn new(pattern: &ThreatPattern) -> Self {
        Self {
            result: ValidationResult {
                pattern_id: pattern.id.clone(),
                ..ValidationResult::default()
            },
        }
    }

    fn error(&mut self, code: &str, path: &str, message: impl Into<String>) {
        self.result.errors.push(diagnostic(
            DiagnosticSeverity::Error,
            code,
            path,
            message.into(),
        ));
    }

    fn warning(&mut self, code: &str, path: &str, message: impl Into<String>) {
        self.result.warnings.push(diagnostic(
            DiagnosticSeverity::Warning,
            code,
            path,
            message.into(),
        ));
    }

    fn require(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.error("required-field", path, "required field is empty");
        }
    }

    fn finish(self) -> ValidationResult {
        self.result
    }
}

fn diagnostic(
    severity: DiagnosticSeverity,
    code: &str,
    path: &str,
    message: String,
) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        path: path.to_string(),
        message,
    }
}

// ─── Rules ──────────────────────────────────────────────────────────────────

fn required_fields(p: &ThreatPattern, r: &mut Report) {
    r.require("id", &p.id);
    r.require("name", &p.name);
    r.require("category", &p.category);
    r.require("description", &p.description);
}

fn agent_summary(p: &ThreatPattern, r: &mut Report) {
    let summary = &p.agent_summary;
    r.require("agent_summary.threat", &summary.threat);
    r.require("agent_summary.check", &summary.check);
    r.require("agent_summary.fix", &summary.fix);

    let len = summary.threat.len() + summary.check.len() + summary.fix.len();
    if len > SUMMARY_CHAR_LIMIT {
        r.warning(
            "summary-length",
            "agent_summary",
            format!("may exceed 100 tokens (approx {} chars)", len),
        );
    }
}

fn triggers(p: &ThreatPattern, r: &mut Report) {
    if p.triggers.keywords.is_empty() {
        r.warning("no-keywords", "triggers.keywords", "no keywords defined");
    }
    for (i, keyword) in p.triggers.keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            r.warning(
                "blank-keyword",
                &format!("triggers.keywords[{}]", i),
                "blank keyword is never indexed",
            );
        }
    }
}

fn mitigations(p: &ThreatPattern, r: &mut Report) {
    if p.mitigations.is_empty() {
        r.error(
            "no-mitigations",
            "mitigations",
            "at least one mitigation required",
        );
    }
    for (i, m) in p.mitigations.iter().enumerate() {
        r.require(&format!("mitigations[{}].id", i), &m.id);
        r.require(&format!("mitigations[{}].description", i), &m.description);

        for (j, ex) in m.code_examples.iter().enumerate() {
            if ex.vulnerable_code.is_none() && ex.secure_code.is_none() {
                r.warning(
                    "empty-code-example",
                    &format!("mitigations[{}].code_examples[{}]", i, j),
                    "should have vulnerable_code and/or secure_code",
                );
            }
        }
    }
}

fn id_format(p: &ThreatPattern, r: &mut Report) {
    if !p.id.is_empty() && !PATTERN_ID_RE.is_match(&p.id) {
        r.warning(
            "id-format",
            "id",
            format!("'{}' does not look like PREFIX-CATEGORY-NNN", p.id),
        );
    }
}

fn references(p: &ThreatPattern, r: &mut Report) {
    for (i, reference) in p.provenance.public_references.iter().enumerate() {
        if let Some(cwe) = &reference.cwe {
            if !CWE_RE.is_match(cwe) {
                r.warning(
                    "cwe-format",
                    &format!("provenance.public_references[{}].cwe", i),
                    format!("'{}' is not of the form CWE-<number>", cwe),
                );
            }
        }
    }
}

fn provenance(p: &ThreatPattern, r: &mut Report) {
    if p.provenance.source_type.trim().is_empty() {
        r.warning(
            "no-source-type",
            "provenance.source_type",
            "recommended for traceability",
        );
    }
}

fn tier_a(p: &ThreatPattern, r: &mut Report) {
    match &p.attack_scenario {
        None => r.error(
            "tier-a-scenario",
            "attack_scenario",
            "required for Tier A patterns",
        ),
        Some(scenario) => {
            if scenario.narrative.trim().is_empty() {
                r.error(
                    "tier-a-scenario",
                    "attack_scenario.narrative",
                    "required for Tier A patterns",
                );
            }
            if scenario.preconditions.is_empty() {
                r.warning(
                    "tier-a-preconditions",
                    "attack_scenario.preconditions",
                    "recommended for Tier A patterns",
                );
            }
        }
    }

    if p.generalizes_to.is_empty() {
        r.warning(
            "tier-a-generalizes-to",
            "generalizes_to",
            "recommended for Tier A patterns",
        );
    }
    if p.security_principles.is_empty() {
        r.warning(
            "tier-a-principles",
            "security_principles",
            "recommended for Tier A patterns",
        );
    }
    if !p.mitigations.iter().any(|m| !m.code_examples.is_empty()) {
        r.warning(
            "tier-a-code-examples",
            "mitigations",
            "Tier A patterns should have code examples",
        );
    }
}
