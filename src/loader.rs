//! Pattern records on disk: one YAML file per pattern under a base directory.
//!
//! ```yaml
//! threat_pattern:
//!   id: TMKB-AUTHZ-001
//!   name: Background Job Authorization
//!   tier: A
//!   severity: high
//!   likelihood: high
//!   agent_summary:
//!     threat: ...
//!     check: ...
//!     fix: ...
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde::de::IgnoredAny;
use walkdir::WalkDir;

use crate::error::{Error, ParseError, ParseErrorKind, Result};
use crate::types::ThreatPattern;

/// Top-level key wrapping every pattern document.
pub const ROOT_KEY: &str = "threat_pattern";

/// Typed document root. Deserializing straight into it keeps plain scalars
/// such as `no` or `1` as text wherever the record expects a string.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    threat_pattern: ThreatPattern,
}

/// Parse a YAML string into a pattern record.
///
/// Performs deserialization and type mapping only; the lint pass in
/// [`crate::validate`] is separate.
pub fn parse_pattern(input: &str) -> std::result::Result<ThreatPattern, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Syntax, "empty input"));
    }

    check_root(input)?;

    serde_saphyr::from_str::<Document>(input)
        .map(|doc| doc.threat_pattern)
        .map_err(|e| {
            let msg = e.to_string();
            ParseError {
                path: Some(ROOT_KEY.to_string()),
                ..ParseError::new(classify_saphyr_error(&msg), msg)
            }
        })
}

/// Root-shape diagnostics: a mapping whose only key is [`ROOT_KEY`]. Values
/// are skipped unread.
fn check_root(input: &str) -> std::result::Result<(), ParseError> {
    let root: BTreeMap<String, IgnoredAny> = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        match classify_saphyr_error(&msg) {
            ParseErrorKind::Syntax => ParseError::new(ParseErrorKind::Syntax, msg),
            _ => ParseError::new(
                ParseErrorKind::TypeMismatch,
                format!("document root must be a YAML mapping: {}", msg),
            ),
        }
    })?;

    if let Some(key) = root.keys().find(|k| k.as_str() != ROOT_KEY) {
        return Err(ParseError {
            path: Some(key.clone()),
            ..ParseError::new(
                ParseErrorKind::TypeMismatch,
                format!("unknown top-level field: {}", key),
            )
        });
    }

    if root.is_empty() {
        return Err(ParseError {
            path: Some(ROOT_KEY.to_string()),
            ..ParseError::new(
                ParseErrorKind::TypeMismatch,
                format!("missing top-level field: {}", ROOT_KEY),
            )
        });
    }
    Ok(())
}

/// Loads pattern files from a base directory.
#[derive(Clone, Debug)]
pub struct Loader {
    base_path: PathBuf,
}

impl Loader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load every `.yaml` / `.yml` file under the base path, in file-name
    /// order. Fails on the first file that cannot be read or parsed.
    pub fn load_all(&self) -> Result<Vec<ThreatPattern>> {
        let mut patterns = Vec::new();

        for entry in WalkDir::new(&self.base_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_yaml(entry.path()) {
                continue;
            }
            patterns.push(self.load_file(entry.path())?);
        }

        tracing::debug!(
            base = %self.base_path.display(),
            count = patterns.len(),
            "loaded patterns"
        );
        Ok(patterns)
    }

    /// Load a single pattern file. The path must lie inside the base path.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ThreatPattern> {
        let path = path.as_ref();
        self.validate_path(path)?;

        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pattern = parse_pattern(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), id = %pattern.id, "loaded pattern");
        Ok(pattern)
    }

    pub fn load_by_id(&self, id: &str) -> Result<ThreatPattern> {
        self.load_all()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// All patterns whose category equals `category`, ignoring case.
    pub fn load_by_category(&self, category: &str) -> Result<Vec<ThreatPattern>> {
        let wanted = category.to_lowercase();
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|p| p.category.to_lowercase() == wanted)
            .collect())
    }

    /// Reject paths that resolve outside the base path.
    ///
    /// Both paths are made absolute and normalized lexically (`.` and `..`
    /// collapse without touching the filesystem), so the file need not exist.
    pub fn validate_path(&self, path: &Path) -> Result<()> {
        let clean_path = absolute_clean(path)?;
        let clean_base = absolute_clean(&self.base_path)?;

        if !clean_path.starts_with(&clean_base) {
            return Err(Error::PathTraversal {
                path: path.to_path_buf(),
                base: self.base_path.clone(),
            });
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

fn absolute_clean(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    Ok(clean)
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown") || lower.contains("variant") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field")
        || lower.contains("type")
        || lower.contains("invalid")
        || lower.contains("expected")
    {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
