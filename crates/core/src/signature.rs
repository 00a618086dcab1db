// crates/core/src/signature.rs

//! Best-effort parameter typing for an extracted callable.

use std::fmt;

use crate::extract::Callable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    Str,
    Int,
    Float,
    Bool,
    /// Element type when declared, e.g. `list[int]`.
    List(Option<Box<TypeHint>>),
    Dict,
    Any,
    /// Missing or unrecognised annotation.
    Unknown,
}

impl TypeHint {
    /// Element type of a typed list, or the hint itself for scalars.
    pub fn element(&self) -> &TypeHint {
        match self {
            TypeHint::List(Some(inner)) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Str => f.write_str("str"),
            TypeHint::Int => f.write_str("int"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::Bool => f.write_str("bool"),
            TypeHint::List(None) => f.write_str("list"),
            TypeHint::List(Some(inner)) => write!(f, "list[{}]", inner),
            TypeHint::Dict => f.write_str("dict"),
            TypeHint::Any => f.write_str("any"),
            TypeHint::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub hint: TypeHint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Parameter>,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Never fails: unreadable annotations degrade to [`TypeHint::Unknown`].
pub fn inspect(callable: &Callable) -> Signature {
    Signature {
        params: callable
            .params()
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                hint: p
                    .annotation
                    .as_deref()
                    .map_or(TypeHint::Unknown, parse_type_hint),
            })
            .collect(),
    }
}

/// Map an annotation atom onto the supported type vocabulary.
pub fn parse_type_hint(annotation: &str) -> TypeHint {
    let annotation = annotation.trim();
    let (base, inner) = match annotation.split_once('[') {
        Some((base, rest)) => match rest.strip_suffix(']') {
            Some(inner) => (base.trim(), Some(inner.trim())),
            None => return TypeHint::Unknown,
        },
        None => (annotation, None),
    };

    match (base, inner) {
        ("str" | "string", None) => TypeHint::Str,
        ("int", None) => TypeHint::Int,
        ("float", None) => TypeHint::Float,
        ("bool", None) => TypeHint::Bool,
        ("any", None) => TypeHint::Any,
        ("list", None) => TypeHint::List(None),
        ("list" | "List", Some(inner)) => match parse_type_hint(inner) {
            TypeHint::Unknown => TypeHint::List(None),
            element => TypeHint::List(Some(Box::new(element))),
        },
        ("dict", None) | ("dict" | "Dict", Some(_)) => TypeHint::Dict,
        ("Optional", Some(inner)) => parse_type_hint(inner),
        _ => TypeHint::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    #[test]
    fn canonical_vocabulary() {
        assert_eq!(parse_type_hint("str"), TypeHint::Str);
        assert_eq!(parse_type_hint("string"), TypeHint::Str);
        assert_eq!(parse_type_hint("int"), TypeHint::Int);
        assert_eq!(parse_type_hint("float"), TypeHint::Float);
        assert_eq!(parse_type_hint("bool"), TypeHint::Bool);
        assert_eq!(parse_type_hint("any"), TypeHint::Any);
        assert_eq!(parse_type_hint("dict[str, int]"), TypeHint::Dict);
        assert_eq!(parse_type_hint("Dict[str, list[int]]"), TypeHint::Dict);
    }

    #[test]
    fn list_element_types() {
        assert_eq!(parse_type_hint("list"), TypeHint::List(None));
        assert_eq!(
            parse_type_hint("List[float]"),
            TypeHint::List(Some(Box::new(TypeHint::Float)))
        );
        assert_eq!(
            parse_type_hint("list[list[int]]").to_string(),
            "list[list[int]]"
        );
        assert_eq!(parse_type_hint("list[Widget]"), TypeHint::List(None));
    }

    #[test]
    fn optional_unwraps_and_unknown_degrades() {
        assert_eq!(parse_type_hint("Optional[int]"), TypeHint::Int);
        assert_eq!(parse_type_hint("Widget"), TypeHint::Unknown);
        assert_eq!(parse_type_hint("String"), TypeHint::Unknown);
        assert_eq!(parse_type_hint("list[int"), TypeHint::Unknown);
    }

    #[test]
    fn inspect_reads_parameters_in_order() {
        let callable = extract("(defn f [path: str, limit, xs: list[int]] path)").unwrap();
        let sig = inspect(&callable);
        assert_eq!(sig.arity(), 3);
        let hints: Vec<_> = sig.params.iter().map(|p| p.hint.to_string()).collect();
        assert_eq!(hints, vec!["str", "unknown", "list[int]"]);
        assert_eq!(sig.params[1].name, "limit");
    }
}
