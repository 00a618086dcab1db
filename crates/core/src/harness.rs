// crates/core/src/harness.rs

//! Runs a candidate against synthesized inputs and decides whether it works.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::extract::{extract_with_limits, ExtractionError};
use crate::novelty::is_novel;
use crate::purpose::Purpose;
use crate::script::{ExecutionLimits, RuntimeError};
use crate::signature::inspect;
use crate::synthesize::{synthesize, ArgTuple, Fixtures};

/// Text the interpreter uses when an annotation-only container name is run as a value.
const TYPE_ARTIFACT_SENTINEL: &str = "cannot be instantiated";

const MISSING_FILE_HINTS: &[&str] = &["no such file", "not exist", "cannot find"];

/// One synthesized input that made the candidate fail.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFailure {
    pub input: ArgTuple,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Name discovered in the source; authoritative for admission.
    pub resolved_name: String,
    pub passed: bool,
    pub errors: Vec<CaseFailure>,
    /// Failures that were recognised as benign and not counted.
    pub discarded: usize,
    pub is_novel: bool,
    pub elapsed: Duration,
}

impl ValidationReport {
    pub fn admissible(&self) -> bool {
        self.passed && self.is_novel
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Fatal,
    /// A type annotation leaked into evaluation; says nothing about the logic.
    TypeAnnotationArtifact,
    /// A file tool probed with a path that is not there.
    ExpectedMissingFile,
}

/// Decide whether a runtime failure counts against the candidate.
pub fn classify_failure(tool_name: &str, error: &RuntimeError) -> FailureClass {
    if error.is_limit() {
        return FailureClass::Fatal;
    }
    let message = error.to_string();
    if message.contains(TYPE_ARTIFACT_SENTINEL) {
        return FailureClass::TypeAnnotationArtifact;
    }
    let lowered = message.to_lowercase();
    if Purpose::File.describes(tool_name) && MISSING_FILE_HINTS.iter().any(|h| lowered.contains(h)) {
        return FailureClass::ExpectedMissingFile;
    }
    FailureClass::Fatal
}

#[derive(Debug, Clone, Default)]
pub struct Harness {
    limits: ExecutionLimits,
}

impl Harness {
    pub fn new(limits: ExecutionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Extract, probe and novelty-check `source`.
    ///
    /// Extraction failure is returned as an error since there is nothing to
    /// run. Every other outcome is described by the report.
    pub fn validate<'a, I>(
        &self,
        source: &str,
        candidate_name: &str,
        existing: I,
    ) -> Result<ValidationReport, ExtractionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let callable = extract_with_limits(source, &self.limits)?;
        let name = callable.name().to_string();
        if name != candidate_name {
            debug!(requested = candidate_name, resolved = %name, "candidate name resolved from source");
        }

        let signature = inspect(&callable);
        let mut fixtures = Fixtures::new();
        let cases = synthesize(&signature, &name, &mut fixtures);

        let started = Instant::now();
        let mut errors = Vec::new();
        let mut discarded = 0;
        for input in cases {
            let outcome = callable.call(input.0.clone(), &self.limits);
            let Err(err) = outcome else { continue };
            match classify_failure(&name, &err) {
                FailureClass::Fatal => {
                    debug!(tool = %name, %input, error = %err, "test case failed");
                    errors.push(CaseFailure {
                        input,
                        message: err.to_string(),
                    });
                }
                class => {
                    debug!(tool = %name, %input, error = %err, ?class, "ignoring benign failure");
                    discarded += 1;
                }
            }
        }
        let elapsed = started.elapsed();

        let is_novel = is_novel(source, existing);
        let passed = errors.is_empty();
        if passed {
            info!(tool = %name, ?elapsed, is_novel, "candidate passed validation");
        } else {
            warn!(tool = %name, ?elapsed, failures = errors.len(), "candidate failed validation");
        }

        Ok(ValidationReport {
            resolved_name: name,
            passed,
            errors,
            discarded,
            is_novel,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_failures_are_discarded() {
        let err = RuntimeError::TypeAsValue("List".into());
        assert_eq!(classify_failure("anything", &err), FailureClass::TypeAnnotationArtifact);
    }

    #[test]
    fn missing_files_only_excused_for_file_tools() {
        let err = RuntimeError::Io {
            path: "test_file.txt".into(),
            message: "No such file or directory (os error 2)".into(),
        };
        assert_eq!(classify_failure("read_lines", &err), FailureClass::ExpectedMissingFile);
        assert_eq!(classify_failure("count_words", &err), FailureClass::Fatal);
    }

    #[test]
    fn budget_errors_are_always_fatal() {
        let err = RuntimeError::StepLimit { limit: 10 };
        assert_eq!(classify_failure("read_file", &err), FailureClass::Fatal);
    }

    #[test]
    fn passing_candidate() {
        let report = Harness::default()
            .validate("(defn shout [s: str] -> str (upper s))", "shout", std::iter::empty())
            .unwrap();
        assert!(report.passed);
        assert!(report.is_novel);
        assert!(report.admissible());
        assert_eq!(report.resolved_name, "shout");
    }

    #[test]
    fn type_leak_does_not_fail_the_batch() {
        let src = "(defn wrap [x] (do List x))";
        let report = Harness::default()
            .validate(src, "wrap", std::iter::empty())
            .unwrap();
        assert!(report.passed);
        assert!(report.errors.is_empty());
        assert_eq!(report.discarded, 5);
    }

    #[test]
    fn file_tool_reads_real_fixture_and_tolerates_missing_paths() {
        let src = "(defn read_file_text [path: str] -> str (file/read path))";
        let report = Harness::default()
            .validate(src, "read_file_text", std::iter::empty())
            .unwrap();
        assert!(report.passed, "{:?}", report.errors);
        assert_eq!(report.discarded, 3);
    }

    #[test]
    fn runaway_candidate_is_stopped() {
        let harness = Harness::new(ExecutionLimits {
            max_steps: 10_000,
            ..ExecutionLimits::default()
        });
        let src = "(defn spin [n: int] (spin n))";
        let report = harness.validate(src, "spin", std::iter::empty()).unwrap();
        assert!(!report.passed);
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn duplicates_are_flagged_even_when_passing() {
        let src = "(defn shout [s: str] -> str (upper s))";
        let report = Harness::default().validate(src, "shout", [src]).unwrap();
        assert!(report.passed);
        assert!(!report.is_novel);
        assert!(!report.admissible());
    }

    #[test]
    fn extraction_failure_is_an_error() {
        let err = Harness::default()
            .validate("(def x 1)", "x", std::iter::empty())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoCallable));
    }

    #[test]
    fn runaway_nesting_is_reported_not_fatal() {
        let src = "(defn wrap_items [n: int] (reduce (fn [acc x] [acc]) [] (range 150000)))";
        let report = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || Harness::default().validate(src, "wrap_items", std::iter::empty()))
            .unwrap()
            .join()
            .unwrap()
            .unwrap();
        assert!(!report.passed);
        assert!(!report.errors.is_empty());
        assert!(report
            .errors
            .iter()
            .all(|failure| failure.message.contains("nesting exceeds")));
    }
}
