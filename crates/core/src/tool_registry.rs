// crates/core/src/tool_registry.rs
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::extract::{extract_with_limits, Callable, ExtractionError};
use crate::normalize::normalize;
use crate::script::{ExecutionLimits, RuntimeError, Value};
use crate::seeds::SEED_TOOLS;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("tool '{name}' failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to persist tools to {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

/// A registered tool. `callable` is always the extraction of `source`.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub source: String,
    pub callable: Callable,
}

/// Named tools backed by a JSON document of `name -> source`.
///
/// Every successful mutation rewrites the whole document. When the write
/// fails the mutation is undone, so memory and disk agree.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
    path: Option<PathBuf>,
    limits: ExecutionLimits,
}

impl ToolRegistry {
    /// A registry that is never persisted and starts empty.
    pub fn in_memory() -> Self {
        Self {
            tools: BTreeMap::new(),
            path: None,
            limits: ExecutionLimits::default(),
        }
    }

    /// Hydrate from `path`, seeding the builtin tools when nothing usable
    /// was found there.
    ///
    /// Never fails: unreadable documents and corrupt entries are logged and
    /// skipped.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let mut registry = Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::in_memory()
        };
        registry.hydrate();
        if registry.tools.is_empty() {
            registry.seed();
        }
        registry
    }

    /// Budget applied to [`execute`](Self::execute).
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn hydrate(&mut self) {
        let Some(path) = self.path.clone() else { return };

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "tools file does not exist yet");
                return;
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to read tools file");
                return;
            }
        };
        if data.trim().is_empty() {
            info!(path = %path.display(), "tools file is empty");
            return;
        }

        let entries: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&data)
        {
            Ok(entries) => entries,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to parse tools file");
                return;
            }
        };

        for (key, value) in entries {
            let Some(source) = value.as_str() else {
                warn!(tool = %key, "skipping tool whose source is not a string");
                continue;
            };
            match self.build(source) {
                Ok(tool) if tool.name == key => {
                    self.tools.insert(key, tool);
                }
                Ok(tool) => {
                    warn!(tool = %key, defined = %tool.name, "skipping tool whose source defines a different name");
                }
                Err(err) => {
                    warn!(tool = %key, error = %err, "skipping tool that failed to load");
                }
            }
        }
        info!(path = %path.display(), count = self.tools.len(), "loaded tools");
    }

    fn seed(&mut self) {
        for (name, source) in SEED_TOOLS {
            match self.build(source) {
                Ok(tool) => {
                    self.tools.insert(tool.name.clone(), tool);
                }
                Err(err) => error!(tool = name, error = %err, "builtin tool failed to load"),
            }
        }
        info!(count = self.tools.len(), "seeded builtin tools");
        if let Err(err) = self.save() {
            error!(error = %err, "failed to save seeded tools");
        }
    }

    fn build(&self, source: &str) -> Result<Tool, ExtractionError> {
        let source = normalize(source);
        let callable = extract_with_limits(&source, &self.limits)?;
        Ok(Tool {
            name: callable.name().to_string(),
            source,
            callable,
        })
    }

    /// Normalize, extract and store `source`, replacing any tool of the same
    /// name. Returns the name discovered in the source, which wins over
    /// `name`.
    ///
    /// No validation happens here; callers that need gating go through the
    /// synthesis pipeline.
    pub fn add(&mut self, name: &str, source: &str) -> Result<String, RegistryError> {
        let tool = self.build(source)?;
        let resolved = tool.name.clone();
        if resolved != name {
            info!(requested = name, resolved = %resolved, "tool registered under the name defined in its source");
        }

        let previous = self.tools.insert(resolved.clone(), tool);
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => {
                    self.tools.insert(resolved, previous);
                }
                None => {
                    self.tools.remove(&resolved);
                }
            }
            return Err(err);
        }
        info!(tool = %resolved, "added tool");
        Ok(resolved)
    }

    /// Returns `Ok(false)` when no such tool exists.
    pub fn remove(&mut self, name: &str) -> Result<bool, RegistryError> {
        let Some(removed) = self.tools.remove(name) else {
            warn!(tool = name, "tool not found");
            return Ok(false);
        };
        if let Err(err) = self.save() {
            self.tools.insert(name.to_string(), removed);
            return Err(err);
        }
        info!(tool = name, "deleted tool");
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.tools.get(name).map(|t| &t.callable)
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn get_source(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|t| t.source.as_str())
    }

    pub fn doc(&self, name: &str) -> Option<&str> {
        self.tools.get(name).and_then(|t| t.callable.doc())
    }

    /// Tool names in registry order.
    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Run a tool. Its own failures come back as [`RegistryError::Execution`]
    /// with the runtime error intact.
    pub fn execute(&self, name: &str, args: Vec<Value>) -> Result<Value, RegistryError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        tool.callable
            .call(args, &self.limits)
            .map_err(|source| RegistryError::Execution {
                name: name.to_string(),
                source,
            })
    }

    /// [`execute`](Self::execute) with JSON arguments and result.
    pub fn execute_json(
        &self,
        name: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, RegistryError> {
        let args = args.iter().map(Value::from).collect();
        self.execute(name, args).map(|v| v.to_json())
    }

    /// Rewrite the backing document. A no-op for in-memory registries.
    pub fn save(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let persistence = |reason: String| RegistryError::Persistence {
            path: path.clone(),
            reason,
        };

        let document: BTreeMap<&str, &str> = self.sources().collect();
        let json = serde_json::to_string_pretty(&document).map_err(|e| persistence(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| persistence(e.to_string()))?;
        file.write_all(json.as_bytes())
            .map_err(|e| persistence(e.to_string()))?;
        file.persist(path)
            .map_err(|e| persistence(e.error.to_string()))?;

        info!(path = %path.display(), count = document.len(), "saved tools");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_uses_the_name_defined_in_source() {
        let mut reg = ToolRegistry::in_memory();
        let name = reg.add("whatever", "(defn double [x: int] (* 2 x))").unwrap();
        assert_eq!(name, "double");
        assert_eq!(reg.list(), vec!["double"]);
        assert!(!reg.contains("whatever"));
    }

    #[test]
    fn add_normalizes_before_storing() {
        let mut reg = ToolRegistry::in_memory();
        reg.add("count", "(defn count_items [xs: List] -> Integer (len xs))")
            .unwrap();
        assert_eq!(
            reg.get_source("count_items"),
            Some("(defn count_items [xs: list] -> int (len xs))")
        );
    }

    #[test]
    fn add_rejects_sources_without_callable() {
        let mut reg = ToolRegistry::in_memory();
        let err = reg.add("nothing", "(def x 1)").unwrap_err();
        assert!(matches!(err, RegistryError::Extraction(ExtractionError::NoCallable)));
        assert!(reg.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let mut reg = ToolRegistry::in_memory();
        reg.add("f", "(defn f [] 1)").unwrap();
        reg.add("f", "(defn f [] 2)").unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.execute("f", vec![]).unwrap(), Value::Int(2));
    }

    #[test]
    fn execute_missing_and_failing_tools() {
        let mut reg = ToolRegistry::in_memory();
        assert!(matches!(
            reg.execute("nope", vec![]),
            Err(RegistryError::NotFound(name)) if name == "nope"
        ));

        reg.add("inv", "(defn inv [n] (/ 1 n))").unwrap();
        match reg.execute("inv", vec![Value::Int(0)]) {
            Err(RegistryError::Execution { name, source }) => {
                assert_eq!(name, "inv");
                assert_eq!(source, RuntimeError::DivisionByZero);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn execute_json_converts_both_ways() {
        let mut reg = ToolRegistry::in_memory();
        reg.add("pairs", "(defn pairs [d: dict] (keys d))").unwrap();
        let out = reg
            .execute_json("pairs", &[serde_json::json!({"b": 1, "a": 2})])
            .unwrap();
        assert_eq!(out, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn remove_reports_absence() {
        let mut reg = ToolRegistry::in_memory();
        reg.add("f", "(defn f [] 1)").unwrap();
        assert!(reg.remove("f").unwrap());
        assert!(!reg.remove("f").unwrap());
        assert!(reg.get("f").is_none());
    }

    #[test]
    fn doc_comes_from_the_callable() {
        let mut reg = ToolRegistry::in_memory();
        reg.add("f", "(defn f [] \"Always one.\" 1)").unwrap();
        assert_eq!(reg.doc("f"), Some("Always one."));
    }
}
