//! Engine configuration.
//!
//! ```yaml
//! token_budget: 500
//! machine_limit: 3
//! human_limit: 10
//! supported_languages: [python]
//! supported_frameworks: [flask]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::enums::Verbosity;
use crate::error::{Error, Result};

/// Tunables for the query engine and the request boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on cumulative pattern tokens in a machine-mode response.
    pub token_budget: usize,
    /// Result count when a machine-mode caller passes `limit = 0`.
    pub machine_limit: usize,
    /// Result count when a human-mode caller passes `limit = 0`.
    pub human_limit: usize,
    /// Languages accepted by [`crate::request`]. Compared lower-cased.
    pub supported_languages: Vec<String>,
    /// Frameworks accepted by [`crate::request`]. `any` is always accepted.
    pub supported_frameworks: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_budget: 500,
            machine_limit: 3,
            human_limit: 10,
            supported_languages: vec!["python".to_string()],
            supported_frameworks: vec!["flask".to_string()],
        }
    }
}

impl EngineConfig {
    /// Parse a YAML configuration. Missing keys take their defaults.
    pub fn from_yaml(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        // A null document (`~`, comments only) is the default configuration.
        let config: Option<Self> =
            serde_saphyr::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.unwrap_or_default())
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Resolves a caller limit: 0 means the default for `verbosity`.
    pub fn effective_limit(&self, limit: usize, verbosity: Verbosity) -> usize {
        if limit > 0 {
            return limit;
        }
        match verbosity {
            Verbosity::Machine => self.machine_limit,
            Verbosity::Human => self.human_limit,
        }
    }
}
