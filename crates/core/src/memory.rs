// crates/core/src/memory.rs

//! Persistent history of reflection snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

/// Snapshots kept on disk and in memory.
pub const MEMORY_CAPACITY: usize = 100;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("failed to write memory file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode memory: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryDocument {
    #[serde(default)]
    thoughts_history: Vec<Value>,
}

/// Current local time in the snapshot timestamp format.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Default)]
pub struct ReflectionMemory {
    path: Option<PathBuf>,
    history: Vec<Value>,
}

impl ReflectionMemory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load history from `path`. Missing or unreadable files start empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let history = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<MemoryDocument>(&data) {
                Ok(doc) => {
                    info!(count = doc.thoughts_history.len(), "loaded thoughts from memory");
                    doc.thoughts_history
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to parse memory file");
                    Vec::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("no existing memory file, starting fresh");
                Vec::new()
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to read memory file");
                Vec::new()
            }
        };
        let mut memory = Self {
            path: Some(path),
            history,
        };
        memory.truncate();
        memory
    }

    fn truncate(&mut self) {
        if self.history.len() > MEMORY_CAPACITY {
            let excess = self.history.len() - MEMORY_CAPACITY;
            self.history.drain(..excess);
        }
    }

    /// Stamp, append and persist a snapshot. Returns the stored snapshot.
    pub fn record(&mut self, mut snapshot: Map<String, Value>) -> Result<Value, MemoryError> {
        snapshot.insert("timestamp".to_string(), Value::String(timestamp()));
        let snapshot = Value::Object(snapshot);
        self.history.push(snapshot.clone());
        self.truncate();
        self.save()?;
        Ok(snapshot)
    }

    /// The last `n` snapshots, oldest first.
    pub fn recent(&self, n: usize) -> &[Value] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn save(&self) -> Result<(), MemoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let doc = MemoryDocument {
            thoughts_history: self.history.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(path, json).map_err(|source| MemoryError::Write {
            path: path.clone(),
            source,
        })?;
        info!(count = self.history.len(), "saved thoughts to memory");
        Ok(())
    }
}
