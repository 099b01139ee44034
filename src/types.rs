use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::enums::*;

/// Accepts any YAML scalar for free-text fields such as `version: 1.0`.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, got {}",
            other
        ))),
    }
}

// ─── Threat pattern ─────────────────────────────────────────────────────────

/// A complete threat pattern record from the knowledge base.
///
/// Records are immutable once loaded. The index shares them behind `Arc`s and
/// never mutates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatPattern {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub last_updated: String,

    // Scope tags, compared case-insensitively.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub framework: String,

    pub severity: Severity,
    pub likelihood: Likelihood,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generalizes_to: Vec<String>,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default)]
    pub triggers: Triggers,
    #[serde(default)]
    pub differentiation: Differentiation,

    #[serde(default)]
    pub description: String,
    pub agent_summary: AgentSummary,

    /// Present for tier A records only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_scenario: Option<AttackScenario>,
    #[serde(default)]
    pub mitigations: Vec<Mitigation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_principles: Vec<SecurityPrinciple>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_patterns: Vec<RelatedPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<Testing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl ThreatPattern {
    /// Keywords used for context matching and relevance scoring.
    pub fn keywords(&self) -> &[String] {
        &self.triggers.keywords
    }

    /// Action trigger phrases matched as substrings of the query context.
    pub fn actions(&self) -> &[String] {
        &self.triggers.actions
    }

    /// Ids of related patterns. Not checked against the collection.
    pub fn related_pattern_ids(&self) -> impl Iterator<Item = &str> {
        self.related_patterns.iter().map(|r| r.id.as_str())
    }

    pub fn cwe_references(&self) -> impl Iterator<Item = &str> {
        self.provenance
            .public_references
            .iter()
            .filter_map(|r| r.cwe.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn owasp_references(&self) -> impl Iterator<Item = &str> {
        self.provenance
            .public_references
            .iter()
            .filter_map(|r| r.owasp.as_deref())
            .filter(|s| !s.is_empty())
    }
}

// ─── Provenance ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_references: Vec<PublicReference>,
}

/// External citation (CWE, OWASP or a plain link).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owasp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ─── Triggers ───────────────────────────────────────────────────────────────

/// When an agent should be shown this pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub file_patterns: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Differentiation {
    #[serde(default)]
    pub llm_knowledge_state: String,
    #[serde(default)]
    pub tmkb_value: String,
    #[serde(default)]
    pub llm_blindspots: Vec<String>,
}

// ─── Agent summary ──────────────────────────────────────────────────────────

/// The compact threat/check/fix triple served to agents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    #[serde(default)]
    pub threat: String,
    #[serde(default)]
    pub check: String,
    #[serde(default)]
    pub fix: String,
}

// ─── Attack scenario ────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackScenario {
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub attack_steps: Vec<AttackStep>,
    #[serde(default)]
    pub impact: Impact,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStep {
    pub step: u32,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    #[serde(default)]
    pub confidentiality: String,
    #[serde(default)]
    pub integrity: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_impact: Option<String>,
}

// ─── Mitigations ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mitigation {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effectiveness: String,
    #[serde(default)]
    pub implementation_effort: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tradeoffs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_examples: Vec<CodeExample>,
}

/// A vulnerable/secure code pair. Either side may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerable_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_code: Option<String>,
}

// ─── Tier A extras ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPrinciple {
    #[serde(default)]
    pub principle: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPattern {
    pub id: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testing {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_verification: Vec<ManualCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub automated_checks: Vec<AutomatedCheck>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCheck {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub check: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedCheck {
    #[serde(rename = "type", default)]
    pub check_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation: Option<String>,
}

// ─── Baseline validation ────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_test: Option<BaselineTest>,
}

/// Recorded behaviour of an unassisted model on this pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineTest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub expected_failure: String,
    #[serde(default)]
    pub observed: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub date: String,
}
