//! The shared query engine.
//!
//! An [`Engine`] is built once and handed by reference to every caller. It is
//! `Send + Sync`; concurrent queries only take read locks on the index.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::enums::Verbosity;
use crate::error::{RequestError, Result};
use crate::index::{Index, PatternRef};
use crate::loader::Loader;
use crate::query::{QueryOptions, rank};
use crate::request::QueryArguments;
use crate::response::{
    QueryResult, ResponseBody, build_human_response, build_machine_response,
    extract_code_pattern,
};
use crate::tokens::{TokenCounter, default_counter};
use crate::types::ThreatPattern;

/// Index, token counter and configuration for one pattern collection.
pub struct Engine {
    index: Index,
    counter: Arc<dyn TokenCounter>,
    config: EngineConfig,
}

impl Engine {
    /// Engine over `patterns` with the default configuration.
    pub fn new(patterns: Vec<ThreatPattern>) -> Self {
        Self::with_config(patterns, EngineConfig::default())
    }

    /// Engine over `patterns` with [`default_counter`], initialised here once.
    pub fn with_config(patterns: Vec<ThreatPattern>, config: EngineConfig) -> Self {
        Self::with_counter(patterns, config, default_counter())
    }

    /// Engine over `patterns` counting tokens with `counter`. No tokenizer is
    /// loaded.
    pub fn with_counter(
        patterns: Vec<ThreatPattern>,
        config: EngineConfig,
        counter: Arc<dyn TokenCounter>,
    ) -> Self {
        Self {
            index: Index::from_patterns(patterns),
            counter,
            config,
        }
    }

    /// Load every pattern under `dir` and build an engine over them.
    pub fn from_dir(dir: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let dir = dir.as_ref();
        let patterns = Loader::new(dir).load_all()?;
        let engine = Self::with_config(patterns, config);
        tracing::info!(
            dir = %dir.display(),
            patterns = engine.index.len(),
            counter = engine.counter.name(),
            "engine loaded"
        );
        Ok(engine)
    }

    /// Replace the token counter of an existing engine. Prefer
    /// [`Engine::with_counter`] when constructing, which skips the default
    /// tokenizer entirely.
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn token_counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<PatternRef> {
        self.index.get_by_id(id)
    }

    /// Run the query pipeline and build the response for `options.verbosity`.
    ///
    /// Never fails: no matches is an empty result, and an unknown filter value
    /// matches nothing.
    pub fn query(&self, options: &QueryOptions) -> QueryResult {
        let candidates = rank(&self.index, options);
        let limit = self
            .config
            .effective_limit(options.limit, options.verbosity);

        let result = match options.verbosity {
            Verbosity::Machine => {
                let mut result = build_machine_response(
                    &candidates,
                    limit,
                    self.counter.as_ref(),
                    self.config.token_budget,
                );
                if let ResponseBody::Machine { code_pattern, .. } = &mut result.body {
                    *code_pattern = candidates.first().and_then(|top| {
                        extract_code_pattern(
                            top,
                            options.language.as_deref(),
                            options.framework.as_ref(),
                        )
                    });
                }
                result
            }
            Verbosity::Human => build_human_response(&candidates, limit),
        };

        tracing::debug!(
            matched = result.pattern_count,
            included = result.patterns_included,
            verbosity = %options.verbosity,
            "query"
        );
        result
    }

    /// Validate untyped tool arguments, then [`Engine::query`].
    pub fn query_arguments(&self, arguments: &Value) -> std::result::Result<QueryResult, RequestError> {
        let options = QueryArguments::from_value(arguments)?.into_options(&self.config)?;
        Ok(self.query(&options))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("patterns", &self.index.len())
            .field("counter", &self.counter.name())
            .field("config", &self.config)
            .finish()
    }
}
