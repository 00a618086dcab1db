// crates/core/src/synthesize.rs

//! Heuristic test-input synthesis.
//!
//! This is not a fuzzer. It produces a handful of argument tuples aimed at
//! the usual ways generated code breaks: empty collections, boundary
//! numbers and values of the wrong shape. The output is deterministic for a
//! given signature, name and fixture set, and never empty.

use std::collections::BTreeMap;
use std::fmt;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::purpose::{classify, Purpose};
use crate::script::Value;
use crate::signature::{Signature, TypeHint};

/// Placeholder content written to the sample file handed to file tools.
pub const SAMPLE_FILE_CONTENT: &str = "This is test content for file operations.\nLine 2\nLine 3";

/// Path used when no real sample file could be created.
const FALLBACK_FILE: &str = "test_file.txt";

/// One positional argument list for a single invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgTuple(pub Vec<Value>);

impl ArgTuple {
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

/// Renders like a tuple literal: `(0,)`, `("a", 1)`, `()`.
impl fmt::Display for ArgTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

/// Real files that synthesized inputs may point at. The backing directory
/// lives as long as the fixtures do.
#[derive(Debug, Default)]
pub struct Fixtures {
    dir: Option<TempDir>,
    sample: Option<String>,
}

impl Fixtures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of a readable text file with [`SAMPLE_FILE_CONTENT`], created on
    /// first use. Falls back to a plain name if the file cannot be written.
    pub fn sample_file(&mut self) -> String {
        if let Some(path) = &self.sample {
            return path.clone();
        }
        let path = match self.create_sample() {
            Ok(path) => {
                debug!(path = %path, "created sample file for file-oriented tool");
                path
            }
            Err(err) => {
                warn!(error = %err, "failed to create sample file, using placeholder name");
                FALLBACK_FILE.to_string()
            }
        };
        self.sample = Some(path.clone());
        path
    }

    fn create_sample(&mut self) -> std::io::Result<String> {
        let dir = tempfile::Builder::new().prefix("toolsmith-").tempdir()?;
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, SAMPLE_FILE_CONTENT)?;
        self.dir = Some(dir);
        Ok(path.to_string_lossy().into_owned())
    }
}

fn strs(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::from(*s)).collect())
}

fn ints(items: &[i64]) -> Value {
    Value::List(items.iter().copied().map(Value::Int).collect())
}

fn floats(items: &[f64]) -> Value {
    Value::List(items.iter().copied().map(Value::Float).collect())
}

fn dict(pairs: &[(&str, Value)]) -> Value {
    Value::Dict(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn empty_list() -> Value {
    Value::List(Vec::new())
}

fn string_battery() -> Vec<Value> {
    ["test", "", "hello world", "12345", "Special @#$ chars!"]
        .into_iter()
        .map(Value::from)
        .collect()
}

fn file_battery(fixtures: &mut Fixtures) -> Vec<Value> {
    vec![
        Value::from(FALLBACK_FILE),
        Value::from("data.csv"),
        Value::from("config.json"),
        Value::from(fixtures.sample_file()),
    ]
}

/// Inputs for a filter-like single-parameter tool: always list-shaped.
fn filter_battery(hint: &TypeHint) -> Vec<Value> {
    match hint.element() {
        TypeHint::Int => vec![
            empty_list(),
            ints(&[1, 2, 3, 4, 5, 6]),
            ints(&[0, -1, 2, -3, 4]),
        ],
        TypeHint::Str => vec![
            empty_list(),
            strs(&["a", "b", "c", "d"]),
            strs(&["hello", "world", "test"]),
        ],
        TypeHint::Float => vec![
            empty_list(),
            floats(&[1.0, 2.5, 3.7, 4.2]),
            floats(&[0.0, -1.5, 3.14, 2.718]),
        ],
        _ => vec![
            empty_list(),
            ints(&[1, 2, 3, 4, 5, 6]),
            strs(&["a", "b", "c", "d"]),
            floats(&[1.0, 2.5, 3.7, 4.2]),
        ],
    }
}

fn list_battery(element: Option<&TypeHint>) -> Vec<Value> {
    match element {
        Some(TypeHint::Int) => vec![empty_list(), ints(&[1, 2, 3]), ints(&[0, -1, 5, 10])],
        Some(TypeHint::Str) => vec![
            empty_list(),
            strs(&["a", "b", "c"]),
            strs(&["hello", "world"]),
        ],
        Some(TypeHint::Float) => vec![
            empty_list(),
            floats(&[1.0, 2.5, 3.7]),
            floats(&[0.0, -1.5, 3.14]),
        ],
        Some(_) => vec![
            empty_list(),
            ints(&[1, 2, 3]),
            strs(&["a", "b", "c"]),
            Value::List(vec![Value::Bool(true), Value::Bool(false)]),
        ],
        None => vec![
            empty_list(),
            ints(&[1, 2, 3]),
            strs(&["a", "b", "c"]),
            floats(&[1.0, 2.5, 3.7]),
        ],
    }
}

fn dict_battery() -> Vec<Value> {
    vec![
        dict(&[]),
        dict(&[("key", Value::from("value"))]),
        dict(&[("a", Value::Int(1)), ("b", Value::Int(2))]),
    ]
}

fn mixed_battery() -> Vec<Value> {
    vec![
        Value::from("test"),
        Value::Int(1),
        Value::Bool(true),
        empty_list(),
        dict(&[]),
    ]
}

/// Full battery for a lone parameter.
fn single_values(hint: &TypeHint, purpose: Purpose, fixtures: &mut Fixtures) -> Vec<Value> {
    if purpose == Purpose::Filter {
        return filter_battery(hint);
    }
    match hint {
        TypeHint::Str if purpose == Purpose::File => file_battery(fixtures),
        TypeHint::Str => string_battery(),
        TypeHint::Int => [0, 1, -1, 100].into_iter().map(Value::Int).collect(),
        TypeHint::Float => [0.0, 1.5, -1.5, 3.14]
            .into_iter()
            .map(Value::Float)
            .collect(),
        TypeHint::Bool => vec![Value::Bool(true), Value::Bool(false)],
        TypeHint::List(element) => list_battery(element.as_deref()),
        TypeHint::Dict => dict_battery(),
        TypeHint::Any | TypeHint::Unknown => match purpose {
            Purpose::Filter | Purpose::List => {
                vec![empty_list(), ints(&[1, 2, 3]), strs(&["a", "b", "c"])]
            }
            Purpose::File => vec![Value::from(FALLBACK_FILE), Value::from(fixtures.sample_file())],
            Purpose::Math => vec![Value::Int(0), Value::Int(1), ints(&[1, 2, 3])],
            Purpose::String => string_battery(),
            Purpose::Unclassified => mixed_battery(),
        },
    }
}

/// Short candidate list for one of two parameters; only the first two
/// entries are used.
fn pair_values(hint: &TypeHint, purpose: Purpose, fixtures: &mut Fixtures) -> Vec<Value> {
    let file_oriented = purpose == Purpose::File;
    let list_oriented = matches!(purpose, Purpose::Filter | Purpose::List);
    match hint {
        TypeHint::Str if file_oriented => {
            vec![Value::from(FALLBACK_FILE), Value::from(fixtures.sample_file())]
        }
        TypeHint::Str => vec![Value::from("test"), Value::from(""), Value::from("hello")],
        TypeHint::Int => vec![Value::Int(0), Value::Int(1), Value::Int(-1)],
        TypeHint::Float => vec![Value::Float(0.0), Value::Float(1.5), Value::Float(-1.5)],
        TypeHint::Bool => vec![Value::Bool(true), Value::Bool(false)],
        TypeHint::List(element) => match element.as_deref() {
            Some(TypeHint::Int) => vec![empty_list(), ints(&[1, 2, 3])],
            Some(TypeHint::Str) => vec![empty_list(), strs(&["a", "b", "c"])],
            _ => vec![empty_list(), ints(&[1, 2, 3]), strs(&["a", "b", "c"])],
        },
        TypeHint::Dict => vec![dict(&[]), dict(&[("key", Value::from("value"))])],
        TypeHint::Any | TypeHint::Unknown if list_oriented => {
            vec![empty_list(), ints(&[1, 2, 3]), strs(&["a", "b", "c"])]
        }
        TypeHint::Any | TypeHint::Unknown if file_oriented => {
            vec![Value::from(FALLBACK_FILE), Value::from(fixtures.sample_file())]
        }
        TypeHint::Any | TypeHint::Unknown => mixed_battery(),
    }
}

/// Produce the argument tuples a candidate is exercised with.
///
/// Every tuple has exactly `signature.arity()` values.
pub fn synthesize(signature: &Signature, name_hint: &str, fixtures: &mut Fixtures) -> Vec<ArgTuple> {
    let purpose = classify(name_hint);
    let tuples: Vec<ArgTuple> = match signature.params.as_slice() {
        [] => vec![ArgTuple(Vec::new())],
        [only] => single_values(&only.hint, purpose, fixtures)
            .into_iter()
            .map(|v| ArgTuple(vec![v]))
            .collect(),
        [first, second] => {
            let xs = pair_values(&first.hint, purpose, fixtures);
            let ys = pair_values(&second.hint, purpose, fixtures);
            let mut tuples = Vec::with_capacity(4);
            for x in xs.iter().take(2) {
                for y in ys.iter().take(2) {
                    tuples.push(ArgTuple(vec![x.clone(), y.clone()]));
                }
            }
            tuples
        }
        many => vec![ArgTuple(vec![Value::Nil; many.len()])],
    };
    debug!(
        tool = name_hint,
        ?purpose,
        cases = tuples.len(),
        "synthesized test inputs"
    );
    tuples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{parse_type_hint, Parameter};

    fn sig(params: &[(&str, Option<&str>)]) -> Signature {
        Signature {
            params: params
                .iter()
                .map(|(name, ann)| Parameter {
                    name: name.to_string(),
                    hint: ann.map_or(TypeHint::Unknown, parse_type_hint),
                })
                .collect(),
        }
    }

    fn render(tuples: &[ArgTuple]) -> Vec<String> {
        tuples.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn tuples_render_like_tuple_literals() {
        assert_eq!(ArgTuple(vec![]).to_string(), "()");
        assert_eq!(ArgTuple(vec![Value::Int(0)]).to_string(), "(0,)");
        assert_eq!(
            ArgTuple(vec![Value::from("a"), Value::Nil]).to_string(),
            r#"("a", nil)"#
        );
    }

    #[test]
    fn int_parameter_gets_boundary_values() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(&sig(&[("n", Some("int"))]), "safe_divide", &mut fx);
        assert_eq!(render(&tuples), vec!["(0,)", "(1,)", "(-1,)", "(100,)"]);
    }

    #[test]
    fn string_parameter_covers_empty_and_special() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(&sig(&[("text", Some("str"))]), "reverse_string", &mut fx);
        assert_eq!(tuples.len(), 5);
        assert!(tuples.contains(&ArgTuple(vec![Value::from("")])));
        assert!(tuples.contains(&ArgTuple(vec![Value::from("Special @#$ chars!")])));
    }

    #[test]
    fn filter_tools_always_get_lists() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(&sig(&[("xs", Some("int"))]), "filter_even", &mut fx);
        assert!(tuples.iter().all(|t| matches!(t.0[0], Value::List(_))));
        assert_eq!(tuples[0], ArgTuple(vec![empty_list()]));
        assert_eq!(tuples[1], ArgTuple(vec![ints(&[1, 2, 3, 4, 5, 6])]));
    }

    #[test]
    fn typed_lists_match_their_element_type() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(
            &sig(&[("numbers", Some("list[float]"))]),
            "calculate_sum",
            &mut fx,
        );
        assert_eq!(
            render(&tuples),
            vec!["([],)", "([1.0, 2.5, 3.7],)", "([0.0, -1.5, 3.14],)"]
        );
    }

    #[test]
    fn file_tools_get_a_real_readable_file() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(&sig(&[("path", Some("str"))]), "read_file_lines", &mut fx);
        assert_eq!(tuples.len(), 4);
        let Value::Str(sample) = &tuples[3].0[0] else {
            panic!("expected a path string");
        };
        assert_eq!(std::fs::read_to_string(sample).unwrap(), SAMPLE_FILE_CONTENT);
        // the same fixture is reused within one synthesis run
        assert_eq!(fx.sample_file(), *sample);
    }

    #[test]
    fn two_parameters_take_bounded_cross_product() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(
            &sig(&[("text", Some("str")), ("times", Some("int"))]),
            "repeat_text",
            &mut fx,
        );
        assert_eq!(
            render(&tuples),
            vec![r#"("test", 0)"#, r#"("test", 1)"#, r#"("", 0)"#, r#"("", 1)"#]
        );
    }

    #[test]
    fn three_or_more_parameters_get_one_nil_tuple() {
        let mut fx = Fixtures::new();
        let tuples = synthesize(&sig(&[("a", None), ("b", None), ("c", None)]), "clamp", &mut fx);
        assert_eq!(render(&tuples), vec!["(nil, nil, nil)"]);
    }

    #[test]
    fn unknown_types_follow_the_name() {
        let mut fx = Fixtures::new();
        let math = synthesize(&sig(&[("x", None)]), "compute_mean", &mut fx);
        assert_eq!(render(&math), vec!["(0,)", "(1,)", "([1, 2, 3],)"]);
        let other = synthesize(&sig(&[("x", None)]), "is_palindrome", &mut fx);
        assert_eq!(other.len(), 5);
    }

    #[test]
    fn never_empty_and_arity_matches() {
        let hints = [
            None,
            Some("str"),
            Some("int"),
            Some("float"),
            Some("bool"),
            Some("list"),
            Some("list[int]"),
            Some("list[str]"),
            Some("dict"),
            Some("any"),
            Some("Widget"),
        ];
        let names = ["filter_items", "read_file", "sort_list", "count_words", "calc", "thing"];
        let mut fx = Fixtures::new();
        for name in names {
            for a in hints {
                for arity in 1..=3 {
                    let params: Vec<_> = (0..arity).map(|i| (["p", "q", "r"][i], a)).collect();
                    let s = sig(&params);
                    let tuples = synthesize(&s, name, &mut fx);
                    assert!(!tuples.is_empty(), "{name} {a:?} arity {arity}");
                    assert!(tuples.iter().all(|t| t.arity() == arity));
                }
            }
        }
    }
}
