// crates/core/src/script/error.rs

//! Errors raised while reading or running toolscript.

use std::time::Duration;

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("line {l}: ")).unwrap_or_default()
}

/// A reader or analyzer failure. `line` is 1-based when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", line_prefix(.line))]
pub struct ParseError {
    pub line: Option<usize>,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Attach a line number unless one is already known.
    pub fn or_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }
}

/// Failures raised by a running tool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    Unbound(String),

    /// A generic container annotation name was evaluated as a value.
    #[error("Type {0} cannot be instantiated")]
    TypeAsValue(String),

    #[error("{function}() takes {expected} argument(s) but {actual} were given")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("{0}")]
    InvalidValue(String),

    /// Raised by the `error` builtin.
    #[error("{0}")]
    Raised(String),

    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid regex '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    #[error("value nesting exceeds {limit} levels")]
    NestingLimit { limit: usize },

    #[error("execution exceeded {limit} steps")]
    StepLimit { limit: u64 },

    #[error("execution exceeded time limit of {limit:?}")]
    Timeout { limit: Duration },

    #[error("execution exceeded maximum call depth of {limit}")]
    RecursionLimit { limit: usize },
}

impl RuntimeError {
    pub(crate) fn type_error(
        operation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
            operation: operation.into(),
        }
    }

    /// Budget violations cannot be caught by `try`; they always unwind to the caller.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::StepLimit { .. } | Self::Timeout { .. } | Self::RecursionLimit { .. }
        )
    }
}
