// crates/host/src/generator.rs

//! Model-backed repair of failing candidates.

use anyhow::Result;
use tracing::{info, warn};

use toolsmith_core::ai_client::AiClient;
use toolsmith_core::harness::CaseFailure;
use toolsmith_core::ingest::extract_code;
use toolsmith_core::pipeline::ToolGenerator;

use crate::prompts;

const REPAIR_TEMPERATURE: f32 = 0.2;

pub struct ModelGenerator<'a, C: AiClient> {
    client: &'a C,
}

impl<'a, C: AiClient> ModelGenerator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

/// One `input: message` line per failure.
pub fn format_failures(errors: &[CaseFailure]) -> String {
    errors
        .iter()
        .map(|e| format!("- input {}: {}", e.input, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

impl<C: AiClient> ToolGenerator for ModelGenerator<'_, C> {
    fn repair(&self, source: &str, errors: &[CaseFailure]) -> Result<Option<String>> {
        info!(failures = errors.len(), "asking model to repair tool");
        let prompt = prompts::repair_prompt(source, &format_failures(errors));
        let reply = self
            .client
            .complete(prompts::REPAIR_SYSTEM, &prompt, REPAIR_TEMPERATURE)?;
        let code = extract_code(&reply);
        if code.is_none() {
            warn!(reply = %reply.chars().take(200).collect::<String>(), "repair reply contained no code");
        }
        Ok(code)
    }
}
