use std::sync::Arc;

use super::common::*;
use tmkb::response::{build_human_response, build_machine_response, extract_code_pattern};
use tmkb::*;

fn candidates(n: usize) -> Vec<PatternRef> {
    (1..=n)
        .map(|i| Arc::new(pattern(&format!("TMKB-TEST-{:03}", i), &["auth"])))
        .collect()
}

// ─── Machine mode ───────────────────────────────────────────────────────────

#[test]
fn stops_before_exceeding_the_budget() {
    let result = build_machine_response(&candidates(5), 5, &FixedCounter(200), 500);
    assert_eq!(result.pattern_count, 5);
    assert_eq!(result.patterns_included, 2);
    assert_eq!(result.token_count(), Some(400));
    assert!(result.token_limit_reached());
}

#[test]
fn exact_fit_is_included() {
    let result = build_machine_response(&candidates(5), 5, &FixedCounter(250), 500);
    assert_eq!(result.patterns_included, 2);
    assert_eq!(result.token_count(), Some(500));
    assert!(result.token_limit_reached());

    let result = build_machine_response(&candidates(2), 5, &FixedCounter(250), 500);
    assert_eq!(result.patterns_included, 2);
    assert_eq!(result.token_count(), Some(500));
    assert!(!result.token_limit_reached());
}

#[test]
fn oversized_first_candidate_is_still_included() {
    let result = build_machine_response(&candidates(3), 3, &FixedCounter(800), 500);
    assert_eq!(result.patterns_included, 1);
    assert_eq!(result.ids(), ["TMKB-TEST-001"]);
    assert_eq!(result.token_count(), Some(800));
    assert!(result.token_limit_reached());
}

#[test]
fn limit_applies_before_budget() {
    let result = build_machine_response(&candidates(10), 3, &FixedCounter(10), 500);
    assert_eq!(result.pattern_count, 10);
    assert_eq!(result.patterns_included, 3);
    assert_eq!(result.token_count(), Some(30));
    assert!(!result.token_limit_reached());
}

#[test]
fn no_candidates_no_patterns() {
    let result = build_machine_response(&[], 3, &FixedCounter(10), 500);
    assert_eq!(result.pattern_count, 0);
    assert_eq!(result.patterns_included, 0);
    assert_eq!(result.token_count(), Some(0));
    assert!(!result.token_limit_reached());
}

#[test]
fn approximate_counter_charges_serialized_length() {
    let list = candidates(1);
    let expected = serde_json::to_string(&serde_json::json!({
        "id": "TMKB-TEST-001",
        "severity": "high",
        "threat": "TMKB-TEST-001 threat",
        "check": "TMKB-TEST-001 check",
        "fix": "TMKB-TEST-001 fix",
    }))
    .unwrap();

    let result = build_machine_response(&list, 3, &ApproxTokenCounter, 500);
    assert_eq!(result.token_count(), Some(expected.len() / 4));
}

/// Charges one token per byte.
struct ByteCounter;

impl TokenCounter for ByteCounter {
    fn count(&self, text: &str) -> usize {
        text.len()
    }

    fn name(&self) -> &'static str {
        "bytes"
    }
}

#[test]
fn every_included_pattern_is_charged_its_compact_json() {
    let result = build_machine_response(&candidates(4), 4, &ByteCounter, 10_000);
    assert_eq!(result.patterns_included, 4);

    let charged: usize = result
        .patterns()
        .iter()
        .map(|p| serde_json::to_string(p).unwrap().len())
        .sum();
    assert!(charged > 0);
    assert_eq!(result.token_count(), Some(charged));
}

#[test]
fn machine_json_shape() {
    let result = build_machine_response(&candidates(1), 3, &FixedCounter(10), 500);
    let value = serde_json::to_value(&result).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["pattern_count", "patterns_included", "token_count", "token_limit_reached", "patterns"]
    );
    let p = &value["patterns"][0];
    assert_eq!(p["id"], "TMKB-TEST-001");
    assert_eq!(p["severity"], "high");
    assert_eq!(p["threat"], "TMKB-TEST-001 threat");
    assert!(value.get("verbose_patterns").is_none());
}

// ─── Human mode ─────────────────────────────────────────────────────────────

#[test]
fn human_mode_has_no_token_accounting() {
    let result = build_human_response(&candidates(4), 10);
    assert_eq!(result.pattern_count, 4);
    assert_eq!(result.patterns_included, 4);
    assert!(result.token_count().is_none());
    assert!(result.patterns().is_empty());

    let value = serde_json::to_value(&result).unwrap();
    assert!(value.get("token_count").is_none());
    assert!(value.get("token_limit_reached").is_none());
    assert!(value.get("patterns").is_none());
    assert_eq!(value["verbose_patterns"].as_array().map(Vec::len), Some(4));
}

#[test]
fn human_mode_respects_limit() {
    let result = build_human_response(&candidates(12), 10);
    assert_eq!(result.pattern_count, 12);
    assert_eq!(result.verbose_patterns().len(), 10);
}

#[test]
fn tier_b_omits_attack_scenario() {
    let result = build_human_response(&candidates(1), 10);
    let value = serde_json::to_value(&result).unwrap();
    let p = &value["verbose_patterns"][0];
    assert!(p.get("attack_scenario").is_none());
    assert!(p.get("related_patterns").is_none());
    assert!(p.get("cwe_references").is_none());
    assert_eq!(p["tier"], "B");
}

#[test]
fn tier_a_carries_full_detail() {
    let mut p = pattern("TMKB-AUTHZ-001", &["job"]);
    p.tier = Tier::A;
    p.attack_scenario = Some(AttackScenario {
        narrative: "An attacker enqueues a job for another tenant.".to_string(),
        preconditions: vec!["Jobs accept raw ids".to_string()],
        attack_steps: vec![AttackStep {
            step: 1,
            action: "Submit a foreign id".to_string(),
            detail: String::new(),
        }],
        impact: Impact::default(),
    });
    p.related_patterns = vec![RelatedPattern {
        id: "TMKB-AUTHZ-002".to_string(),
        ..RelatedPattern::default()
    }];
    p.provenance.public_references = vec![
        PublicReference {
            cwe: Some("CWE-862".to_string()),
            ..PublicReference::default()
        },
        PublicReference {
            owasp: Some("A01:2021".to_string()),
            ..PublicReference::default()
        },
    ];
    p.mitigations = vec![Mitigation {
        id: "MIT-001".to_string(),
        description: "Re-authorize in the worker".to_string(),
        code_examples: vec![CodeExample {
            vulnerable_code: Some("run(job)".to_string()),
            secure_code: Some("authorize(job); run(job)".to_string()),
            ..CodeExample::default()
        }],
        ..Mitigation::default()
    }];

    let result = build_human_response(&[Arc::new(p)], 10);
    let verbose = &result.verbose_patterns()[0];
    let scenario = verbose.attack_scenario.as_ref().expect("tier A scenario");
    assert_eq!(scenario.steps.len(), 1);
    assert_eq!(verbose.related_patterns, ["TMKB-AUTHZ-002"]);
    assert_eq!(verbose.cwe_references, ["CWE-862"]);
    assert_eq!(verbose.owasp_references, ["A01:2021"]);
    assert_eq!(verbose.mitigations[0].code_examples.len(), 1);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value["verbose_patterns"][0]["attack_scenario"]["narrative"],
        "An attacker enqueues a job for another tenant."
    );
}

// ─── Code templates ─────────────────────────────────────────────────────────

fn example(language: &str, framework: &str, secure: Option<&str>) -> CodeExample {
    CodeExample {
        language: language.to_string(),
        framework: framework.to_string(),
        secure_code: secure.map(str::to_string),
        ..CodeExample::default()
    }
}

fn mitigation(effectiveness: &str, examples: Vec<CodeExample>) -> Mitigation {
    Mitigation {
        id: "MIT".to_string(),
        effectiveness: effectiveness.to_string(),
        code_examples: examples,
        ..Mitigation::default()
    }
}

#[test]
fn prefers_high_effectiveness_matching_example() {
    let mut p = pattern("TMKB-AUTHZ-001", &["job"]);
    p.mitigations = vec![
        mitigation("medium", vec![example("python", "flask", Some("medium"))]),
        mitigation(
            "High",
            vec![
                example("python", "django", Some("django")),
                example("python", "flask", Some("flask")),
            ],
        ),
    ];

    let flask = FrameworkFilter::from("flask");
    let code = extract_code_pattern(&p, Some("python"), Some(&flask)).unwrap();
    assert_eq!(code.secure_template, "flask");

    let code = extract_code_pattern(&p, None, None).unwrap();
    assert_eq!(code.secure_template, "django");
}

#[test]
fn falls_back_to_any_secure_example() {
    let mut p = pattern("TMKB-AUTHZ-001", &["job"]);
    p.mitigations = vec![
        mitigation("high", vec![example("python", "flask", None)]),
        mitigation("low", vec![example("go", "gin", Some("fallback"))]),
    ];

    let code = extract_code_pattern(&p, Some("python"), None).unwrap();
    assert_eq!(code.secure_template, "fallback");
    assert_eq!(code.language, "go");
}

#[test]
fn no_secure_code_no_template() {
    let mut p = pattern("TMKB-AUTHZ-001", &["job"]);
    p.mitigations = vec![mitigation("high", vec![example("python", "flask", Some(""))])];
    assert!(extract_code_pattern(&p, None, None).is_none());
}
