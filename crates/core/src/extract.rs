// crates/core/src/extract.rs

//! Loads a tool source into a fresh namespace and pulls out its callable.

use std::sync::Arc;

use thiserror::Error;

use crate::script::{
    make_closure, parse_program, Closure, ExecutionLimits, Function, Globals, Interpreter, Param,
    ParseError, RuntimeError, RuntimeResult, TopLevel, Value,
};

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The source does not read or analyze as toolscript.
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// A top-level form raised while the namespace was being built.
    #[error("evaluation failed at line {line}: {source}")]
    Evaluation {
        line: usize,
        #[source]
        source: RuntimeError,
    },

    #[error("source defines no callable")]
    NoCallable,

    #[error("source defines more than one callable: {}", .names.join(", "))]
    MultipleCallables { names: Vec<String> },
}

/// A user-defined function together with the namespace it was defined in.
#[derive(Debug, Clone)]
pub struct Callable {
    name: String,
    closure: Arc<Closure>,
    globals: Arc<Globals>,
}

impl Callable {
    /// The binding name the function was found under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.closure.def.params
    }

    pub fn arity(&self) -> usize {
        self.closure.def.params.len()
    }

    pub fn returns(&self) -> Option<&str> {
        self.closure.def.returns.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.closure.def.doc.as_deref()
    }

    /// Invoke under a fresh execution budget.
    pub fn call(&self, args: Vec<Value>, limits: &ExecutionLimits) -> RuntimeResult<Value> {
        let mut interp = Interpreter::new(&self.globals, *limits);
        interp.call(&Function::Closure(Arc::clone(&self.closure)), args)
    }
}

/// Extract with the default definition-time budget.
pub fn extract(source: &str) -> Result<Callable, ExtractionError> {
    extract_with_limits(source, &ExecutionLimits::default())
}

/// Evaluate every top-level form of `source` in an isolated namespace and
/// return its single user-defined callable.
///
/// Only closures count as callables; a `def` that aliases a builtin does not.
pub fn extract_with_limits(
    source: &str,
    limits: &ExecutionLimits,
) -> Result<Callable, ExtractionError> {
    let program = parse_program(source)?;
    let mut globals = Globals::default();

    for top in &program {
        match top {
            TopLevel::Defn { name, lambda, .. } => {
                globals.define(name.clone(), make_closure(lambda, None));
            }
            TopLevel::Def { name, value, line } => {
                let value = Interpreter::new(&globals, *limits)
                    .eval_top(value)
                    .map_err(|source| ExtractionError::Evaluation {
                        line: *line,
                        source,
                    })?;
                globals.define(name.clone(), value);
            }
            TopLevel::Expr { expr, line } => {
                Interpreter::new(&globals, *limits)
                    .eval_top(expr)
                    .map_err(|source| ExtractionError::Evaluation {
                        line: *line,
                        source,
                    })?;
            }
        }
    }

    let mut found: Vec<(String, Arc<Closure>)> = globals
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Function(Function::Closure(c)) => Some((name.to_string(), Arc::clone(c))),
            _ => None,
        })
        .collect();

    match found.len() {
        0 => Err(ExtractionError::NoCallable),
        1 => {
            let (name, closure) = found.remove(0);
            Ok(Callable {
                name,
                closure,
                globals: Arc::new(globals),
            })
        }
        _ => Err(ExtractionError::MultipleCallables {
            names: found.into_iter().map(|(name, _)| name).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_single_defn() {
        let callable = extract(
            r#"
; helper constant is fine, it is not callable
(def greeting "hello")

(defn greet [name: str] -> str
  "Greet someone."
  (str greeting ", " name))
"#,
        )
        .unwrap();
        assert_eq!(callable.name(), "greet");
        assert_eq!(callable.arity(), 1);
        assert_eq!(callable.doc(), Some("Greet someone."));
        assert_eq!(
            callable
                .call(vec![Value::from("bob")], &ExecutionLimits::default())
                .unwrap(),
            Value::from("hello, bob")
        );
    }

    #[test]
    fn def_bound_lambda_takes_the_binding_name() {
        let callable = extract("(def double (fn [x] (* 2 x)))").unwrap();
        assert_eq!(callable.name(), "double");
    }

    #[test]
    fn builtin_alias_is_not_a_callable() {
        let err = extract("(def my_len len)").unwrap_err();
        assert!(matches!(err, ExtractionError::NoCallable));
    }

    #[test]
    fn several_callables_are_rejected() {
        let err = extract("(defn a [] 1)\n(defn b [] 2)").unwrap_err();
        match err {
            ExtractionError::MultipleCallables { names } => assert_eq!(names, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn definition_time_failures_carry_the_line() {
        let err = extract("(defn f [] 1)\n(def boom (/ 1 0))").unwrap_err();
        match err {
            ExtractionError::Evaluation { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source, RuntimeError::DivisionByZero);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = extract("(defn broken [x] (+ x 1)").unwrap_err();
        assert!(matches!(err, ExtractionError::Syntax(_)));
        assert!(err.to_string().starts_with("syntax error: line 1"));
    }

    #[test]
    fn namespaces_are_isolated() {
        let a = extract("(def k 1)\n(defn get_k [] k)").unwrap();
        let b = extract("(def k 2)\n(defn get_k [] k)").unwrap();
        let limits = ExecutionLimits::default();
        assert_eq!(a.call(vec![], &limits).unwrap(), Value::Int(1));
        assert_eq!(b.call(vec![], &limits).unwrap(), Value::Int(2));
    }
}
