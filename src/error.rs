use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error for loading, configuration and rendering.
///
/// Querying never fails; only the collaborators around the engine do.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("path traversal detected: {} is outside base path {}", path.display(), base.display())]
    PathTraversal { path: PathBuf, base: PathBuf },

    #[error("failed to walk patterns directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("pattern not found: {0}")]
    NotFound(String),

    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    EncodeYaml(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownVariant,
}

/// Produced by `parse_pattern` when a record cannot be deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}: {}", line, col, self.message)
        } else if let Some(path) = &self.path {
            write!(f, "{}: {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Rejection of untyped query arguments at the request boundary.
///
/// Messages keep the wording tool clients already match on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("arguments must be an object")]
    NotAnObject,

    #[error("context must be non-empty")]
    EmptyContext,

    #[error("Invalid language '{value}'. Supported languages: {supported}")]
    UnsupportedLanguage { value: String, supported: String },

    #[error("Invalid framework '{value}'. Supported frameworks: {supported}")]
    UnsupportedFramework { value: String, supported: String },

    #[error("Invalid verbosity '{0}'. Supported values: agent, human")]
    InvalidVerbosity(String),

    #[error("Invalid limit '{0}'. Expected a non-negative integer")]
    InvalidLimit(String),

    #[error("Parameter '{field}' must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unknown parameter '{name}'. Supported parameters: {allowed}")]
    UnknownParameter { name: String, allowed: String },
}

// ─── Validation diagnostics ─────────────────────────────────────────────────

/// Diagnostic severity level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A structured finding produced by the record lint pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        };
        write!(f, "[{}] {}: {} ({})", level, self.path, self.message, self.code)
    }
}

/// Lint result for a single pattern: errors and warnings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub pattern_id: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
