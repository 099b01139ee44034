//! Token counting for the machine-mode budget.
//!
//! The engine holds one [`TokenCounter`] for its lifetime. [`default_counter`]
//! prefers the exact `cl100k_base` tokenizer (feature `tiktoken`) and degrades
//! to [`ApproxTokenCounter`] when it cannot be initialised. The degradation is
//! logged and never surfaces as an error.

use std::sync::Arc;

/// Counts tokens in serialized output.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Character approximation: one token per four bytes, rounded down.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.len() / 4
    }

    fn name(&self) -> &'static str {
        "approx"
    }
}

/// Exact counter wrapping tiktoken's `cl100k_base` encoding.
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    pub fn new() -> crate::Result<Self> {
        let bpe =
            tiktoken_rs::cl100k_base().map_err(|e| crate::Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &'static str {
        "cl100k_base"
    }
}

/// The best counter available in this build.
///
/// Call once at startup; tokenizer initialisation is the only slow step in
/// the engine.
pub fn default_counter() -> Arc<dyn TokenCounter> {
    #[cfg(feature = "tiktoken")]
    {
        match TiktokenCounter::new() {
            Ok(counter) => return Arc::new(counter),
            Err(e) => {
                tracing::warn!(error = %e, "token counter initialisation failed, using approximation");
            }
        }
    }
    Arc::new(ApproxTokenCounter)
}
