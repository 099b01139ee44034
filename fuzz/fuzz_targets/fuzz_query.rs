#![no_main]

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use serde_json::json;
use tmkb::{ApproxTokenCounter, Engine, EngineConfig, QueryOptions, ThreatPattern, Verbosity};

const SEVERITIES: &[&str] = &["critical", "high", "medium", "low"];
const LIKELIHOODS: &[&str] = &["high", "medium", "low"];

/// Generate a small pattern record from fuzzer bytes.
fn arbitrary_pattern(u: &mut Unstructured<'_>, n: usize) -> arbitrary::Result<ThreatPattern> {
    let keywords = Vec::<String>::arbitrary(u)?;
    let actions = Vec::<String>::arbitrary(u)?;
    let value = json!({
        "id": format!("FUZZ-{:03}", n),
        "name": String::arbitrary(u)?,
        "tier": if bool::arbitrary(u)? { "A" } else { "B" },
        "severity": u.choose(SEVERITIES)?,
        "likelihood": u.choose(LIKELIHOODS)?,
        "framework": String::arbitrary(u)?,
        "triggers": { "keywords": keywords, "actions": actions },
        "agent_summary": {
            "threat": String::arbitrary(u)?,
            "check": String::arbitrary(u)?,
            "fix": String::arbitrary(u)?,
        },
    });
    serde_json::from_value(value).map_err(|_| arbitrary::Error::IncorrectFormat)
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let count = match u.int_in_range(0..=8) {
        Ok(c) => c,
        Err(_) => return,
    };
    let mut patterns = Vec::with_capacity(count);
    for n in 0..count {
        match arbitrary_pattern(&mut u, n) {
            Ok(p) => patterns.push(p),
            Err(_) => return,
        }
    }

    let (context, limit, human) = match <(String, u8, bool)>::arbitrary(&mut u) {
        Ok(v) => v,
        Err(_) => return,
    };

    let engine = Engine::with_counter(patterns, EngineConfig::default(), Arc::new(ApproxTokenCounter));
    let verbosity = if human { Verbosity::Human } else { Verbosity::Machine };
    let result = engine.query(
        &QueryOptions::new(context)
            .limit(limit as usize)
            .verbosity(verbosity),
    );

    assert!(result.patterns_included <= result.pattern_count);
    if result.pattern_count > 0 {
        assert!(result.patterns_included >= 1);
    }
});
