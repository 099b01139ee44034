//! Response builders and the result envelope.
//!
//! Machine mode projects each candidate to a compact summary and stops once
//! the token budget is spent. Human mode projects the full record with no
//! accounting. The two projections never share an envelope: [`ResponseBody`]
//! is one or the other.

use serde::Serialize;

use crate::enums::{FrameworkFilter, Likelihood, Severity, Tier};
use crate::index::PatternRef;
use crate::tokens::TokenCounter;
use crate::types::{AttackStep, CodeExample, Impact, Mitigation, ThreatPattern};

// ─── Envelope ───────────────────────────────────────────────────────────────

/// Result of a query.
///
/// Serializes flat:
///
/// ```json
/// {"pattern_count": 4, "patterns_included": 3, "token_count": 212,
///  "token_limit_reached": false, "patterns": [...]}
/// ```
///
/// or, in human mode, `{"pattern_count", "patterns_included",
/// "verbose_patterns": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// Candidates that survived matching and filtering, before the limit.
    pub pattern_count: usize,
    /// Patterns actually present in the body.
    pub patterns_included: usize,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Machine {
        token_count: usize,
        token_limit_reached: bool,
        patterns: Vec<PatternOutput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code_pattern: Option<CodePatternOutput>,
    },
    Human {
        verbose_patterns: Vec<PatternOutputVerbose>,
    },
}

impl QueryResult {
    /// Compact projections; empty for human-mode results.
    pub fn patterns(&self) -> &[PatternOutput] {
        match &self.body {
            ResponseBody::Machine { patterns, .. } => patterns,
            ResponseBody::Human { .. } => &[],
        }
    }

    /// Full projections; empty for machine-mode results.
    pub fn verbose_patterns(&self) -> &[PatternOutputVerbose] {
        match &self.body {
            ResponseBody::Machine { .. } => &[],
            ResponseBody::Human { verbose_patterns } => verbose_patterns,
        }
    }

    /// Ids in response order, whichever projection is present.
    pub fn ids(&self) -> Vec<&str> {
        match &self.body {
            ResponseBody::Machine { patterns, .. } => {
                patterns.iter().map(|p| p.id.as_str()).collect()
            }
            ResponseBody::Human { verbose_patterns } => {
                verbose_patterns.iter().map(|p| p.id.as_str()).collect()
            }
        }
    }

    pub fn token_count(&self) -> Option<usize> {
        match &self.body {
            ResponseBody::Machine { token_count, .. } => Some(*token_count),
            ResponseBody::Human { .. } => None,
        }
    }

    pub fn token_limit_reached(&self) -> bool {
        matches!(
            self.body,
            ResponseBody::Machine {
                token_limit_reached: true,
                ..
            }
        )
    }

    pub fn code_pattern(&self) -> Option<&CodePatternOutput> {
        match &self.body {
            ResponseBody::Machine { code_pattern, .. } => code_pattern.as_ref(),
            ResponseBody::Human { .. } => None,
        }
    }
}

// ─── Projections ────────────────────────────────────────────────────────────

/// Compact agent-facing summary of a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternOutput {
    pub id: String,
    pub severity: Severity,
    pub threat: String,
    pub check: String,
    pub fix: String,
}

impl From<&ThreatPattern> for PatternOutput {
    fn from(p: &ThreatPattern) -> Self {
        Self {
            id: p.id.clone(),
            severity: p.severity,
            threat: p.agent_summary.threat.clone(),
            check: p.agent_summary.check.clone(),
            fix: p.agent_summary.fix.clone(),
        }
    }
}

/// Secure code template lifted from the top-ranked pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CodePatternOutput {
    pub language: String,
    pub framework: String,
    pub secure_template: String,
}

/// Human-facing full projection of a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternOutputVerbose {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    pub severity: Severity,
    pub likelihood: Likelihood,
    pub threat: String,
    pub check: String,
    pub fix: String,
    pub description: String,
    /// Absent (not null) for tier B records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_scenario: Option<AttackScenarioOutput>,
    pub mitigations: Vec<MitigationVerbose>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cwe_references: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owasp_references: Vec<String>,
}

impl From<&ThreatPattern> for PatternOutputVerbose {
    fn from(p: &ThreatPattern) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            tier: p.tier,
            severity: p.severity,
            likelihood: p.likelihood,
            threat: p.agent_summary.threat.clone(),
            check: p.agent_summary.check.clone(),
            fix: p.agent_summary.fix.clone(),
            description: p.description.clone(),
            attack_scenario: p.attack_scenario.as_ref().map(|s| AttackScenarioOutput {
                narrative: s.narrative.clone(),
                preconditions: s.preconditions.clone(),
                steps: s.attack_steps.clone(),
                impact: s.impact.clone(),
            }),
            mitigations: p.mitigations.iter().map(MitigationVerbose::from).collect(),
            related_patterns: p.related_pattern_ids().map(str::to_string).collect(),
            cwe_references: p.cwe_references().map(str::to_string).collect(),
            owasp_references: p.owasp_references().map(str::to_string).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttackScenarioOutput {
    pub narrative: String,
    pub preconditions: Vec<String>,
    pub steps: Vec<AttackStep>,
    pub impact: Impact,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MitigationVerbose {
    pub id: String,
    pub name: String,
    pub description: String,
    pub effectiveness: String,
    pub implementation_effort: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tradeoffs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub code_examples: Vec<CodeExample>,
}

impl From<&Mitigation> for MitigationVerbose {
    fn from(m: &Mitigation) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone().unwrap_or_default(),
            description: m.description.clone(),
            effectiveness: m.effectiveness.clone(),
            implementation_effort: m.implementation_effort.clone(),
            tradeoffs: m.tradeoffs.clone(),
            code_examples: m.code_examples.clone(),
        }
    }
}

// ─── Builders ───────────────────────────────────────────────────────────────

/// Token-budgeted compact response.
///
/// Walks `candidates` in order, up to `limit`, adding each compact projection
/// while `running + cost <= token_budget`. The first candidate is always
/// included, even when it alone exceeds the budget; `token_limit_reached` is
/// set whenever the budget stopped the walk or was overrun.
pub fn build_machine_response(
    candidates: &[PatternRef],
    limit: usize,
    counter: &dyn TokenCounter,
    token_budget: usize,
) -> QueryResult {
    let mut patterns = Vec::with_capacity(limit.min(candidates.len()));
    let mut total_tokens = 0;
    let mut limit_reached = false;

    for p in candidates.iter().take(limit) {
        let output = PatternOutput::from(p.as_ref());
        let cost = serialized_cost(counter, &output);

        if !patterns.is_empty() && total_tokens + cost > token_budget {
            limit_reached = true;
            break;
        }

        patterns.push(output);
        total_tokens += cost;

        if patterns.len() == 1 && total_tokens > token_budget {
            limit_reached = true;
            break;
        }
    }

    QueryResult {
        pattern_count: candidates.len(),
        patterns_included: patterns.len(),
        body: ResponseBody::Machine {
            token_count: total_tokens,
            token_limit_reached: limit_reached,
            patterns,
            code_pattern: None,
        },
    }
}

/// Tokens in the compact JSON encoding of `output`.
///
/// `PatternOutput` holds only strings and string-backed enums, so encoding it
/// to JSON is infallible and the empty fallback is never taken.
fn serialized_cost(counter: &dyn TokenCounter, output: &PatternOutput) -> usize {
    counter.count(&serde_json::to_string(output).unwrap_or_default())
}

/// Unbounded full response: the first `limit` candidates, fully projected.
pub fn build_human_response(candidates: &[PatternRef], limit: usize) -> QueryResult {
    let verbose_patterns: Vec<PatternOutputVerbose> = candidates
        .iter()
        .take(limit)
        .map(|p| PatternOutputVerbose::from(p.as_ref()))
        .collect();

    QueryResult {
        pattern_count: candidates.len(),
        patterns_included: verbose_patterns.len(),
        body: ResponseBody::Human { verbose_patterns },
    }
}

/// Best secure code template for a pattern.
///
/// Prefers high-effectiveness mitigations whose example matches the language
/// and framework filters; falls back to the first secure example anywhere.
pub fn extract_code_pattern(
    pattern: &ThreatPattern,
    language: Option<&str>,
    framework: Option<&FrameworkFilter>,
) -> Option<CodePatternOutput> {
    let wanted_framework = framework.and_then(FrameworkFilter::name);

    let preferred = pattern
        .mitigations
        .iter()
        .filter(|m| m.effectiveness.eq_ignore_ascii_case("high"))
        .flat_map(|m| &m.code_examples)
        .filter(|ex| language.is_none_or(|l| ex.language.to_lowercase() == l.to_lowercase()))
        .filter(|ex| {
            wanted_framework
                .is_none_or(|f| ex.framework.to_lowercase().contains(&f.to_lowercase()))
        })
        .find_map(template);

    preferred.or_else(|| {
        pattern
            .mitigations
            .iter()
            .flat_map(|m| &m.code_examples)
            .find_map(template)
    })
}

fn template(ex: &CodeExample) -> Option<CodePatternOutput> {
    let secure = ex.secure_code.as_deref().filter(|s| !s.is_empty())?;
    Some(CodePatternOutput {
        language: ex.language.clone(),
        framework: ex.framework.clone(),
        secure_template: secure.to_string(),
    })
}
