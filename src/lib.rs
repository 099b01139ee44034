//! Threat Model Knowledge Base: relevance-ranked threat pattern retrieval.
//!
//! A knowledge base is a directory of YAML threat pattern records. This crate
//! indexes them in memory and answers free-text queries ("what am I building?")
//! with the most relevant patterns, in one of two shapes:
//!
//! ```text
//! load(dir) → Engine ─ query(options) → rank → limit ┬ machine: token-budgeted summaries
//!                                                    └ human:   full records
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tmkb::{ApproxTokenCounter, Engine, EngineConfig, QueryOptions};
//!
//! let yaml = r#"
//! threat_pattern:
//!   id: TMKB-AUTHZ-001
//!   name: Background Job Authorization Context Loss
//!   tier: B
//!   severity: high
//!   likelihood: high
//!   language: python
//!   framework: flask
//!   triggers:
//!     keywords: [background job, celery]
//!   agent_summary:
//!     threat: Jobs run without the requesting user's authorization context.
//!     check: Does every job re-verify the tenant it acts on?
//!     fix: Pass the user and tenant ids and re-authorize inside the job.
//! "#;
//!
//! let pattern = tmkb::parse_pattern(yaml).expect("valid record");
//! let engine = Engine::with_counter(
//!     vec![pattern],
//!     EngineConfig::default(),
//!     Arc::new(ApproxTokenCounter),
//! );
//!
//! let result = engine.query(&QueryOptions::new("a celery background job that sends invoices"));
//! assert_eq!(result.patterns_included, 1);
//! assert_eq!(result.patterns()[0].id, "TMKB-AUTHZ-001");
//! ```
//!
//! # Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `tiktoken` | yes     | Exact `cl100k_base` token counts via [`tiktoken-rs`](https://docs.rs/tiktoken-rs). Without it, [`tokens::ApproxTokenCounter`] is used. |

pub mod config;
pub mod engine;
pub mod enums;
pub mod error;
pub mod index;
pub mod loader;
pub mod output;
pub mod query;
pub mod request;
pub mod response;
pub mod scoring;
pub mod tokens;
pub mod types;
pub mod validate;

pub use config::EngineConfig;
pub use engine::Engine;
pub use enums::*;
pub use error::*;
pub use index::{Index, PatternRef};
pub use query::QueryOptions;
pub use request::QueryArguments;
pub use response::{QueryResult, ResponseBody};
pub use tokens::{ApproxTokenCounter, TokenCounter};
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use loader::parse_pattern;
pub use output::format_output;
pub use scoring::{calculate_relevance, extract_keywords};
pub use validate::{validate, validate_all};

/// Convenience entry point composing load → index → engine, with the
/// default configuration.
///
/// # Errors
///
/// Fails on the first file under `dir` that cannot be read or parsed.
///
/// # Example
///
/// ```no_run
/// let engine = tmkb::load("patterns").expect("readable knowledge base");
/// println!("{} patterns", engine.index().len());
/// ```
pub fn load(dir: impl AsRef<std::path::Path>) -> Result<Engine> {
    Engine::from_dir(dir, EngineConfig::default())
}
