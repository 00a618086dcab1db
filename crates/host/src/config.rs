// crates/host/src/config.rs

//! Host settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use toolsmith_core::openai_client::DEFAULT_BASE_URL;
use toolsmith_core::script::ExecutionLimits;

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub tools_file: PathBuf,
    pub memory_file: PathBuf,
    pub docs_file: PathBuf,
    /// Unbounded when `None`.
    pub max_cycles: Option<u64>,
    pub sleep_after_success: Duration,
    pub sleep_after_failure: Duration,
    pub limits: ExecutionLimits,
    pub log_json: bool,
    /// When set, solve this task with the current tools instead of
    /// running improvement cycles.
    pub task: Option<String>,
}

impl HostConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| -> Result<Option<u64>> {
            var(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{key} must be a non-negative integer, got {v:?}"))
                })
                .transpose()
        };

        let api_key = var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;

        let mut limits = ExecutionLimits::default();
        if let Some(ms) = parsed("TOOLSMITH_EXEC_TIMEOUT_MS")? {
            limits.timeout = Duration::from_millis(ms);
        }
        if let Some(steps) = parsed("TOOLSMITH_EXEC_MAX_STEPS")? {
            limits.max_steps = steps;
        }

        Ok(Self {
            api_key,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("TOOLSMITH_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            tools_file: var("TOOLSMITH_TOOLS_FILE")
                .unwrap_or_else(|| "tools.json".to_string())
                .into(),
            memory_file: var("TOOLSMITH_MEMORY_FILE")
                .unwrap_or_else(|| "swarm_memory.json".to_string())
                .into(),
            docs_file: var("TOOLSMITH_DOCS_FILE")
                .unwrap_or_else(|| "tools_documentation.md".to_string())
                .into(),
            max_cycles: parsed("TOOLSMITH_MAX_CYCLES")?,
            sleep_after_success: Duration::from_secs(
                parsed("TOOLSMITH_SLEEP_SUCCESS_SECS")?.unwrap_or(30),
            ),
            sleep_after_failure: Duration::from_secs(
                parsed("TOOLSMITH_SLEEP_FAILURE_SECS")?.unwrap_or(60),
            ),
            limits,
            log_json: var("TOOLSMITH_LOG_JSON")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            task: var("TOOLSMITH_TASK"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<HostConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HostConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.tools_file, PathBuf::from("tools.json"));
        assert_eq!(cfg.memory_file, PathBuf::from("swarm_memory.json"));
        assert_eq!(cfg.docs_file, PathBuf::from("tools_documentation.md"));
        assert_eq!(cfg.max_cycles, None);
        assert_eq!(cfg.sleep_after_success, Duration::from_secs(30));
        assert_eq!(cfg.sleep_after_failure, Duration::from_secs(60));
        assert_eq!(cfg.limits.max_steps, ExecutionLimits::default().max_steps);
        assert!(!cfg.log_json);
        assert_eq!(cfg.task, None);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("TOOLSMITH_MODEL", "gpt-4o-mini"),
            ("TOOLSMITH_MAX_CYCLES", "3"),
            ("TOOLSMITH_SLEEP_SUCCESS_SECS", "0"),
            ("TOOLSMITH_EXEC_TIMEOUT_MS", "250"),
            ("TOOLSMITH_EXEC_MAX_STEPS", "5000"),
            ("TOOLSMITH_LOG_JSON", "1"),
            ("TOOLSMITH_TASK", "reverse 'stressed'"),
        ])
        .unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_cycles, Some(3));
        assert_eq!(cfg.sleep_after_success, Duration::ZERO);
        assert_eq!(cfg.limits.timeout, Duration::from_millis(250));
        assert_eq!(cfg.limits.max_steps, 5000);
        assert!(cfg.log_json);
        assert_eq!(cfg.task.as_deref(), Some("reverse 'stressed'"));
    }

    #[test]
    fn missing_key_and_bad_numbers_fail() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let err = config(&[("OPENAI_API_KEY", "k"), ("TOOLSMITH_MAX_CYCLES", "lots")]).unwrap_err();
        assert!(err.to_string().contains("TOOLSMITH_MAX_CYCLES"));
    }
}
