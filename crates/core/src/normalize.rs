// crates/core/src/normalize.rs

//! Tolerant front end for annotation spelling.
//!
//! Generators routinely write `List`, `Dict` or `String` where the tool
//! language expects `list`, `dict` and `str`. Normalization rewrites those
//! tokens so the source reads with the supported vocabulary. It is total:
//! anything it does not recognise is left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TYPE_ALIAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(List|Dict|String|Integer|Boolean|Float)\b").expect("valid type alias pattern")
});

fn canonical(alias: &str) -> Option<&'static str> {
    Some(match alias {
        "List" => "list",
        "Dict" => "dict",
        "String" => "str",
        "Integer" => "int",
        "Boolean" => "bool",
        "Float" => "float",
        _ => return None,
    })
}

/// Rewrite capitalised type aliases to their canonical lowercase names.
///
/// Generic containers are only rewritten when used bare; `List[int]` is kept
/// as written because the subscripted form is already understood.
pub fn normalize(source: &str) -> String {
    TYPE_ALIAS
        .replace_all(source, |caps: &Captures<'_>| {
            let m = &caps[0];
            let end = caps.get(0).map_or(0, |g| g.end());
            let subscripted = source[end..].starts_with('[');
            match canonical(m) {
                Some(_) if subscripted && matches!(m, "List" | "Dict") => m.to_string(),
                Some(name) => name.to_string(),
                None => m.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_generics_become_builtin_names() {
        assert_eq!(
            normalize("(defn f [xs: List, m: Dict] -> List xs)"),
            "(defn f [xs: list, m: dict] -> list xs)"
        );
    }

    #[test]
    fn subscripted_generics_are_left_alone() {
        assert_eq!(
            normalize("(defn f [xs: List[String]] -> Dict[String, Integer] xs)"),
            "(defn f [xs: List[str]] -> Dict[str, int] xs)"
        );
    }

    #[test]
    fn scalar_aliases_match_whole_tokens_only() {
        assert_eq!(
            normalize("(defn f [a: String, b: Boolean, c: Float, StringBuilder] a)"),
            "(defn f [a: str, b: bool, c: float, StringBuilder] a)"
        );
        assert_eq!(normalize("MyInteger Integers _Float"), "MyInteger Integers _Float");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "",
            "(defn f [x: List[Integer]] -> List x)",
            "String String[ Dict[List] Boolean",
            "no types here at all",
            "(defn g [d: Dict, s: String] (get d s))",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }
}
