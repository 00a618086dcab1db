// crates/core/src/script/value.rs

//! Runtime values of the tool language.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::ast::LambdaDef;
use super::error::{RuntimeError, RuntimeResult};
use super::stdlib::Builtin;

/// Deepest list/dict nesting a running tool may build. Dropping or
/// printing a value recurses once per level.
pub const MAX_NESTING: usize = 500;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Function(Function),
}

#[derive(Clone)]
pub enum Function {
    Closure(Arc<Closure>),
    Builtin(&'static Builtin),
}

/// A lambda plus the local scope it was created in. Top-level definitions
/// carry no scope; their free names resolve against the module globals.
#[derive(Debug)]
pub struct Closure {
    pub def: Arc<LambdaDef>,
    pub scope: Option<Arc<Scope>>,
}

/// One frame of local bindings.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn child(parent: Option<Arc<Scope>>) -> Self {
        Self {
            vars: HashMap::new(),
            parent,
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(v) => Some(v),
            None => self.parent.as_deref().and_then(|p| p.lookup(name)),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
        }
    }

    /// Python-style truthiness: empty and zero values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
            Value::Function(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text used by `str` and string concatenation: strings are unquoted,
    /// everything else uses its display form.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Whether lists/dicts nest more than `limit` levels deep. Only descends
    /// `limit + 1` levels.
    pub fn nests_deeper_than(&self, limit: usize) -> bool {
        match self {
            Value::List(items) => {
                limit == 0 || items.iter().any(|v| v.nests_deeper_than(limit - 1))
            }
            Value::Dict(map) => limit == 0 || map.values().any(|v| v.nests_deeper_than(limit - 1)),
            _ => false,
        }
    }

    /// Pass a freshly built container through, or fail if it is nested past
    /// [`MAX_NESTING`].
    pub(crate) fn within_nesting(self) -> RuntimeResult<Value> {
        if self.nests_deeper_than(MAX_NESTING) {
            Err(RuntimeError::NestingLimit { limit: MAX_NESTING })
        } else {
            Ok(self)
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Function(f) => serde_json::Value::String(format!("<function {}>", f.name())),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => fmt_float(*x, f),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name()),
        }
    }
}

fn fmt_float(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Closure(c) => c.def.name.as_deref().unwrap_or("<lambda>"),
            Function::Builtin(b) => b.name,
        }
    }

    fn same_as(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            (Function::Builtin(a), Function::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_readable_and_stable() {
        let v = Value::List(vec![
            Value::Int(1),
            Value::Float(2.0),
            Value::Float(3.14),
            Value::Str("a b".into()),
            Value::Nil,
        ]);
        assert_eq!(v.to_string(), r#"[1, 2.0, 3.14, "a b", nil]"#);

        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::Bool(true));
        assert_eq!(Value::Dict(map).to_string(), r#"{"a": true, "b": 2}"#);
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
        assert!(Value::Float(-0.5).is_truthy());
    }

    #[test]
    fn ints_and_floats_compare_numerically() {
        assert_eq!(Value::Int(6), Value::Float(6.0));
        assert_ne!(Value::Int(6), Value::Str("6".into()));
    }

    #[test]
    fn json_conversion_preserves_structure() {
        let json = serde_json::json!({"xs": [1, 2.5, "s", null], "ok": true});
        let value = Value::from(&json);
        assert_eq!(value.to_json(), json);
    }
}
