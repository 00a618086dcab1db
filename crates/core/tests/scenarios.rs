// crates/core/tests/scenarios.rs

use std::cell::RefCell;

use pretty_assertions::assert_eq;

use toolsmith_core::harness::{CaseFailure, Harness};
use toolsmith_core::novelty::similarity;
use toolsmith_core::pipeline::{Candidate, Rejection, SynthesisOutcome, Synthesizer, ToolGenerator};
use toolsmith_core::script::Value;
use toolsmith_core::seeds::REVERSE_STRING;
use toolsmith_core::tool_registry::ToolRegistry;

/// Hands out one canned repair and records what it was asked.
struct ScriptedGenerator {
    reply: Option<String>,
    calls: RefCell<Vec<(String, Vec<CaseFailure>)>>,
}

impl ScriptedGenerator {
    fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ToolGenerator for ScriptedGenerator {
    fn repair(&self, source: &str, errors: &[CaseFailure]) -> anyhow::Result<Option<String>> {
        self.calls
            .borrow_mut()
            .push((source.to_string(), errors.to_vec()));
        Ok(self.reply.clone())
    }
}

fn seeded() -> (tempfile::TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = ToolRegistry::open(dir.path().join("tools.json"));
    (dir, registry)
}

#[test]
fn scenario_a_reverse_string() {
    let (_dir, registry) = seeded();
    let reverse = |s: &str| registry.execute("reverse_string", vec![Value::from(s)]).unwrap();
    assert_eq!(reverse("abc"), Value::from("cba"));
    assert_eq!(reverse(""), Value::from(""));
}

#[test]
fn scenario_b_calculate_sum() {
    let (_dir, registry) = seeded();
    let sum = |xs: Vec<i64>| {
        let xs = Value::List(xs.into_iter().map(Value::Int).collect());
        registry.execute("calculate_sum", vec![xs]).unwrap()
    };
    assert_eq!(sum(vec![1, 2, 3]), Value::Int(6));
    assert_eq!(sum(vec![]), Value::Int(0));
}

#[test]
fn scenario_c_near_copy_is_not_novel() {
    let (_dir, mut registry) = seeded();
    let near_copy = REVERSE_STRING.replace("reversed", "result");
    assert!(similarity(&near_copy, REVERSE_STRING) >= 0.8);

    // it would pass validation on its own
    let report = Harness::default()
        .validate(&near_copy, "reverse_string", std::iter::empty())
        .unwrap();
    assert!(report.passed);

    let generator = ScriptedGenerator::new(None);
    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("reverse_string", near_copy),
        &generator,
    );
    assert!(matches!(
        outcome,
        SynthesisOutcome::Rejected(Rejection::NotNovel { .. })
    ));
    assert_eq!(generator.call_count(), 0);
    assert_eq!(registry.get_source("reverse_string"), Some(REVERSE_STRING));
}

#[test]
fn scenario_d_division_by_zero_is_repaired() {
    let (_dir, mut registry) = seeded();
    let broken = "(defn calculate_inverse [n: int] -> float\n  \"One over n.\"\n  (/ 1 n))";
    let fixed = "(defn calculate_inverse [n: int] -> float\n  \"One over n, or zero for zero.\"\n  (if (= n 0) 0.0 (/ 1 n)))";

    let report = Harness::default()
        .validate(broken, "calculate_inverse", registry.sources().map(|(_, s)| s))
        .unwrap();
    assert!(!report.passed);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].input.to_string(), "(0,)");
    assert_eq!(report.errors[0].message, "division by zero");

    let generator = ScriptedGenerator::new(Some(fixed));
    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("calculate_inverse", broken),
        &generator,
    );
    match outcome {
        SynthesisOutcome::Admitted { name, repaired } => {
            assert_eq!(name, "calculate_inverse");
            assert!(repaired);
        }
        other => panic!("expected admission, got {other:?}"),
    }
    assert_eq!(generator.call_count(), 1);
    let calls = generator.calls.borrow();
    assert_eq!(calls[0].0, broken);
    assert_eq!(calls[0].1, report.errors);

    assert_eq!(
        registry.execute("calculate_inverse", vec![Value::Int(0)]).unwrap(),
        Value::Float(0.0)
    );
    assert_eq!(
        registry.execute("calculate_inverse", vec![Value::Int(4)]).unwrap(),
        Value::Float(0.25)
    );
}

#[test]
fn second_failure_is_terminal() {
    let mut registry = ToolRegistry::in_memory();
    let broken = "(defn inverse [n: int] (/ 1 n))";
    let still_broken = "(defn inverse [n: int] (/ 2 n))";
    let generator = ScriptedGenerator::new(Some(still_broken));

    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("inverse", broken),
        &generator,
    );
    match outcome {
        SynthesisOutcome::Rejected(Rejection::Validation { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].input.to_string(), "(0,)");
        }
        other => panic!("expected validation rejection, got {other:?}"),
    }
    assert_eq!(generator.call_count(), 1);
    assert!(registry.is_empty());
}

#[test]
fn missing_repair_rejects_with_original_errors() {
    let mut registry = ToolRegistry::in_memory();
    let generator = ScriptedGenerator::new(None);
    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("inverse", "(defn inverse [n: int] (/ 1 n))"),
        &generator,
    );
    assert!(matches!(
        outcome,
        SynthesisOutcome::Rejected(Rejection::Validation { ref errors }) if errors.len() == 1
    ));
}

#[test]
fn unloadable_candidate_is_rejected_without_repair() {
    let mut registry = ToolRegistry::in_memory();
    let generator = ScriptedGenerator::new(Some("(defn ok [] 1)"));
    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("broken", "(defn broken [x] (+ x 1)"),
        &generator,
    );
    assert!(matches!(
        outcome,
        SynthesisOutcome::Rejected(Rejection::Extraction(_))
    ));
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn admitted_under_resolved_name_with_normalized_source() {
    let mut registry = ToolRegistry::in_memory();
    let generator = ScriptedGenerator::new(None);
    let outcome = Synthesizer::default().synthesize_candidate(
        &mut registry,
        &Candidate::new("dedupe", "(defn unique_items [items: List] -> List (unique items))"),
        &generator,
    );
    assert_eq!(outcome.admitted_name(), Some("unique_items"));
    assert_eq!(
        registry.get_source("unique_items"),
        Some("(defn unique_items [items: list] -> list (unique items))")
    );
}
