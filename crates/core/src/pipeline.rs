// crates/core/src/pipeline.rs

//! Candidate admission: normalize, validate, check novelty, repair once, add.

use tracing::{info, warn};

use crate::extract::ExtractionError;
use crate::harness::{CaseFailure, Harness, ValidationReport};
use crate::normalize::normalize;
use crate::tool_registry::{RegistryError, ToolRegistry};

/// A proposed tool that has not been admitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub source: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Something that can rewrite a failing tool.
pub trait ToolGenerator {
    /// Corrected source for `source` given the failures it produced, or
    /// `None` when no usable code came back.
    fn repair(&self, source: &str, errors: &[CaseFailure]) -> anyhow::Result<Option<String>>;
}

/// Why a candidate did not become a tool.
#[derive(Debug)]
pub enum Rejection {
    Extraction(ExtractionError),
    /// Still failing after the repair attempt, or no repair was available.
    Validation { errors: Vec<CaseFailure> },
    NotNovel { name: String },
    Admission(RegistryError),
}

#[derive(Debug)]
pub enum SynthesisOutcome {
    Admitted { name: String, repaired: bool },
    Rejected(Rejection),
}

impl SynthesisOutcome {
    pub fn admitted_name(&self) -> Option<&str> {
        match self {
            SynthesisOutcome::Admitted { name, .. } => Some(name),
            SynthesisOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    harness: Harness,
}

impl Synthesizer {
    pub fn new(harness: Harness) -> Self {
        Self { harness }
    }

    fn validate(
        &self,
        registry: &ToolRegistry,
        source: &str,
        name: &str,
    ) -> Result<ValidationReport, ExtractionError> {
        self.harness
            .validate(source, name, registry.sources().map(|(_, src)| src))
    }

    /// Take one candidate through validation, at most one repair round and
    /// admission.
    pub fn synthesize_candidate(
        &self,
        registry: &mut ToolRegistry,
        candidate: &Candidate,
        generator: &dyn ToolGenerator,
    ) -> SynthesisOutcome {
        let source = normalize(&candidate.source);
        let report = match self.validate(registry, &source, &candidate.name) {
            Ok(report) => report,
            Err(err) => {
                warn!(tool = %candidate.name, error = %err, "candidate could not be loaded");
                return SynthesisOutcome::Rejected(Rejection::Extraction(err));
            }
        };

        if !report.is_novel {
            info!(tool = %report.resolved_name, "candidate is too similar to an existing tool");
            return SynthesisOutcome::Rejected(Rejection::NotNovel {
                name: report.resolved_name,
            });
        }
        if report.passed {
            return admit(registry, &report.resolved_name, &source, false);
        }

        info!(tool = %report.resolved_name, failures = report.errors.len(), "attempting to repair candidate");
        let repaired = match generator.repair(&source, &report.errors) {
            Ok(Some(code)) => normalize(&code),
            Ok(None) => {
                warn!(tool = %report.resolved_name, "repair produced no code");
                return SynthesisOutcome::Rejected(Rejection::Validation {
                    errors: report.errors,
                });
            }
            Err(err) => {
                warn!(tool = %report.resolved_name, error = %err, "repair request failed");
                return SynthesisOutcome::Rejected(Rejection::Validation {
                    errors: report.errors,
                });
            }
        };

        let second = match self.validate(registry, &repaired, &report.resolved_name) {
            Ok(second) => second,
            Err(err) => {
                warn!(tool = %report.resolved_name, error = %err, "repaired candidate could not be loaded");
                return SynthesisOutcome::Rejected(Rejection::Extraction(err));
            }
        };
        if !second.passed {
            warn!(tool = %second.resolved_name, failures = second.errors.len(), "repaired candidate still fails");
            return SynthesisOutcome::Rejected(Rejection::Validation {
                errors: second.errors,
            });
        }
        if !second.is_novel {
            return SynthesisOutcome::Rejected(Rejection::NotNovel {
                name: second.resolved_name,
            });
        }
        admit(registry, &second.resolved_name, &repaired, true)
    }
}

fn admit(registry: &mut ToolRegistry, name: &str, source: &str, repaired: bool) -> SynthesisOutcome {
    match registry.add(name, source) {
        Ok(name) => {
            info!(tool = %name, repaired, "admitted new tool");
            SynthesisOutcome::Admitted { name, repaired }
        }
        Err(err) => {
            warn!(tool = name, error = %err, "failed to admit tool");
            SynthesisOutcome::Rejected(Rejection::Admission(err))
        }
    }
}
