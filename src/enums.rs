//! Closed enumerations used throughout the pattern model and query surface.
//!
//! These are "closed" enums: only the defined variants are valid. Parsing is
//! case-insensitive; serialization is always the canonical spelling. Free-text
//! scope tags (category, language, framework) stay strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a string does not name any variant of a closed enum.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Depth classification of a pattern. Tier A carries an attack scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Tier {
    A,
    B,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
        }
    }
}

impl FromStr for Tier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Tier::A),
            "B" | "b" => Ok(Tier::B),
            other => Err(UnknownVariant::new("tier", other, "A, B")),
        }
    }
}

/// Severity classification. Declaration order is rank order: critical first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank; lower ranks sort first.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(UnknownVariant::new(
                "severity",
                s,
                "critical, high, medium, low",
            )),
        }
    }
}

/// Likelihood of exploitation. Declaration order is rank order: high first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Likelihood {
    High,
    Medium,
    Low,
}

impl Likelihood {
    /// Sort rank; lower ranks sort first.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Likelihood::High => "high",
            Likelihood::Medium => "medium",
            Likelihood::Low => "low",
        }
    }
}

impl FromStr for Likelihood {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Likelihood::High),
            "medium" => Ok(Likelihood::Medium),
            "low" => Ok(Likelihood::Low),
            _ => Err(UnknownVariant::new("likelihood", s, "high, medium, low")),
        }
    }
}

/// Response shape requested by the caller.
///
/// `Machine` is the token-budgeted compact projection for agents; `Human` is
/// the unabridged projection. The wire spelling `agent` is accepted as an
/// alias for `machine`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Verbosity {
    #[default]
    Machine,
    Human,
}

impl FromStr for Verbosity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "machine" | "agent" => Ok(Verbosity::Machine),
            "human" => Ok(Verbosity::Human),
            _ => Err(UnknownVariant::new("verbosity", s, "agent, human")),
        }
    }
}

/// Rendering format for [`crate::output`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

impl FromStr for OutputFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "text" => Ok(OutputFormat::Text),
            _ => Err(UnknownVariant::new("output format", s, "json, yaml, text")),
        }
    }
}

/// Framework filter. `Any` is a wildcard that never removes a candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameworkFilter {
    Any,
    Named(String),
}

impl FrameworkFilter {
    /// Whether a record tagged with `framework` passes this filter.
    pub fn matches(&self, framework: &str) -> bool {
        match self {
            FrameworkFilter::Any => true,
            FrameworkFilter::Named(name) => framework.to_lowercase() == name.to_lowercase(),
        }
    }

    /// The concrete framework name, or `None` for the wildcard.
    pub fn name(&self) -> Option<&str> {
        match self {
            FrameworkFilter::Any => None,
            FrameworkFilter::Named(name) => Some(name),
        }
    }
}

impl From<&str> for FrameworkFilter {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("any") {
            FrameworkFilter::Any
        } else {
            FrameworkFilter::Named(trimmed.to_lowercase())
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = UnknownVariant;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )*
    };
}

string_conversions!(Tier, Severity, Likelihood, Verbosity, OutputFormat);

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Machine => f.write_str("machine"),
            Verbosity::Human => f.write_str("human"),
        }
    }
}
