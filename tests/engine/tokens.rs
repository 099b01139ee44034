use std::sync::Arc;

use super::common::*;
use tmkb::tokens::default_counter;
use tmkb::*;

#[test]
fn approx_counts_four_bytes_per_token() {
    assert_eq!(ApproxTokenCounter.count(""), 0);
    assert_eq!(ApproxTokenCounter.count("abc"), 0);
    assert_eq!(ApproxTokenCounter.count("hello world"), 2);
    assert_eq!(ApproxTokenCounter.name(), "approx");
}

#[test]
fn injected_counter_is_kept() {
    let engine = Engine::with_counter(vec![], EngineConfig::default(), Arc::new(FixedCounter(7)));
    assert_eq!(engine.token_counter().count("anything"), 7);

    let engine = engine.with_token_counter(Arc::new(ApproxTokenCounter));
    assert_eq!(engine.token_counter().name(), "approx");
}

#[cfg(feature = "tiktoken")]
mod tiktoken {
    use super::*;
    use tmkb::tokens::TiktokenCounter;

    fn long_pattern(id: &str) -> ThreatPattern {
        let mut p = pattern(id, &["auth"]);
        p.agent_summary.threat = "tenant scoped authorization is skipped ".repeat(30);
        p
    }

    #[test]
    fn default_counter_prefers_cl100k() {
        assert_eq!(default_counter().name(), "cl100k_base");
        assert_eq!(Engine::new(vec![]).token_counter().name(), "cl100k_base");
    }

    #[test]
    fn counts_bpe_tokens() {
        let counter = TiktokenCounter::new().unwrap();
        assert_eq!(counter.count("hello world"), 2);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn default_engine_stays_within_budget() {
        let patterns = (1..=6)
            .map(|i| long_pattern(&format!("TMKB-TEST-{:03}", i)))
            .collect();
        let engine = Engine::new(patterns);
        let result = engine.query(&QueryOptions::new("auth").limit(6));

        let tokens = result.token_count().unwrap();
        assert!(tokens <= engine.config().token_budget, "{}", tokens);
        assert!(result.patterns_included >= 1);
        assert!(result.patterns_included < result.pattern_count);
        assert!(result.token_limit_reached());

        let counter = engine.token_counter();
        let charged: usize = result
            .patterns()
            .iter()
            .map(|p| counter.count(&serde_json::to_string(p).unwrap()))
            .sum();
        assert_eq!(tokens, charged);
    }
}

#[cfg(not(feature = "tiktoken"))]
#[test]
fn default_counter_is_approx_without_tiktoken() {
    assert_eq!(default_counter().name(), "approx");
}
