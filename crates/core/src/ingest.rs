// crates/core/src/ingest.rs

//! Pulls tool code out of free-form generator responses.
//!
//! Responses arrive as a YAML document with `name` and `code`, as Markdown
//! with fenced blocks, or as bare code surrounded by prose. Each strategy is
//! tried in that order and the first that yields a definition wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::pipeline::Candidate;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[^\n]*\n(.*?)```").expect("valid fence pattern")
});

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\(\s*(?:defn|def)\s+([^\s()\[\]{}";]+)"#).expect("valid definition pattern")
});

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("response is empty")]
    Empty,

    #[error("response contains no tool definition")]
    NoDefinition,
}

#[derive(Debug, Deserialize)]
struct GeneratedTool {
    #[serde(default)]
    name: Option<String>,
    code: String,
}

struct Fence<'a> {
    lang: &'a str,
    body: &'a str,
}

fn fences(text: &str) -> impl Iterator<Item = Fence<'_>> {
    FENCED_BLOCK.captures_iter(text).filter_map(|caps| {
        Some(Fence {
            lang: caps.get(1)?.as_str(),
            body: caps.get(2)?.as_str(),
        })
    })
}

fn has_definition(code: &str) -> bool {
    DEFINITION.is_match(code)
}

/// Name bound by the first `defn`/`def` in `code`.
pub fn definition_name(code: &str) -> Option<String> {
    DEFINITION
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_yaml_tool(text: &str) -> Option<GeneratedTool> {
    serde_yml::from_str::<GeneratedTool>(text)
        .ok()
        .filter(|tool| has_definition(&tool.code))
}

/// Consecutive balanced top-level forms starting at the beginning of `text`.
/// Stops at the first non-form text or an unbalanced form.
fn balanced_forms(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut i = 0;
    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b';' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if i >= bytes.len() || bytes[i] != b'(' {
            break;
        }
        match close_of(bytes, i) {
            Some(close) => {
                i = close + 1;
                end = i;
            }
            None => break,
        }
    }
    &text[..end]
}

/// Index of the delimiter closing the one at `start`.
fn close_of(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b';' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn from_first_definition(text: &str) -> Option<String> {
    let start = DEFINITION.find(text)?.start();
    let forms = balanced_forms(&text[start..]);
    if forms.is_empty() {
        // unbalanced: hand the rest over and let extraction report it
        Some(text[start..].trim().to_string())
    } else {
        Some(forms.to_string())
    }
}

/// Turn a generator response into a candidate.
pub fn parse_generated_tool(text: &str, fallback_name: &str) -> Result<Candidate, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let (name, code) = if let Some(tool) = parse_yaml_tool(text) {
        debug!("parsed structured tool response");
        (tool.name, tool.code)
    } else if let Some(tool) = fences(text)
        .filter(|f| f.lang.eq_ignore_ascii_case("yaml") || f.lang.eq_ignore_ascii_case("yml"))
        .find_map(|f| parse_yaml_tool(f.body))
    {
        debug!("parsed fenced yaml tool response");
        (tool.name, tool.code)
    } else if let Some(fence) = fences(text).find(|f| has_definition(f.body)) {
        debug!(lang = fence.lang, "using fenced code block");
        (None, fence.body.trim().to_string())
    } else if let Some(code) = from_first_definition(text) {
        debug!("using raw definition from response text");
        (None, code)
    } else {
        return Err(IngestError::NoDefinition);
    };

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| definition_name(&code))
        .unwrap_or_else(|| fallback_name.to_string());
    Ok(Candidate::new(name, code))
}

/// Code-only variant of [`parse_generated_tool`], used for repair replies.
pub fn extract_code(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('(') && has_definition(trimmed) {
        let forms = balanced_forms(trimmed);
        if !forms.is_empty() {
            return Some(forms.to_string());
        }
    }
    if let Some(tool) = parse_yaml_tool(trimmed) {
        return Some(tool.code);
    }
    if let Some(fence) = fences(trimmed).find(|f| has_definition(f.body)) {
        return Some(fence.body.trim().to_string());
    }
    from_first_definition(trimmed)
}

/// A JSON object from a reply: the whole text, a ```json block, or the
/// outermost braces.
pub fn parse_json_object(text: &str) -> Option<serde_json::Value> {
    let object = |s: &str| {
        serde_json::from_str::<serde_json::Value>(s.trim())
            .ok()
            .filter(serde_json::Value::is_object)
    };
    if let Some(value) = object(text) {
        return Some(value);
    }
    if let Some(value) = fences(text)
        .filter(|f| f.lang.eq_ignore_ascii_case("json"))
        .find_map(|f| object(f.body))
    {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    object(&text[start..=end])
}

/// A YAML mapping from a reply, as JSON: the whole text or a ```yaml block.
pub fn parse_yaml_object(text: &str) -> Option<serde_json::Value> {
    let mapping = |s: &str| {
        serde_yml::from_str::<serde_json::Value>(s)
            .ok()
            .filter(serde_json::Value::is_object)
    };
    if let Some(value) = mapping(text) {
        return Some(value);
    }
    fences(text)
        .filter(|f| f.lang.eq_ignore_ascii_case("yaml") || f.lang.eq_ignore_ascii_case("yml"))
        .find_map(|f| mapping(f.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CODE: &str = "(defn count_vowels [text: str] -> int\n  (count (filter (fn [c] (contains? \"aeiou\" c)) (chars text))))";

    #[test]
    fn structured_yaml_document() {
        let text = format!("name: count_vowels\ncode: |\n  {}\n", CODE.replace('\n', "\n  "));
        let candidate = parse_generated_tool(&text, "fallback").unwrap();
        assert_eq!(candidate.name, "count_vowels");
        assert_eq!(candidate.source.trim_end(), CODE);
    }

    #[test]
    fn json_is_accepted_as_yaml() {
        let text = serde_json::json!({"name": "vowels", "code": CODE}).to_string();
        let candidate = parse_generated_tool(&text, "fallback").unwrap();
        assert_eq!(candidate.name, "vowels");
        assert_eq!(candidate.source, CODE);
    }

    #[test]
    fn fenced_yaml_block_inside_prose() {
        let text = format!(
            "Here is the tool:\n\n```yaml\nname: count_vowels\ncode: |\n  {}\n```\nEnjoy!",
            CODE.replace('\n', "\n  ")
        );
        let candidate = parse_generated_tool(&text, "fallback").unwrap();
        assert_eq!(candidate.name, "count_vowels");
        assert!(candidate.source.starts_with("(defn count_vowels"));
    }

    #[test]
    fn fenced_code_block_takes_name_from_definition() {
        let text = format!("Sure.\n```clojure\n{}\n```\n", CODE);
        let candidate = parse_generated_tool(&text, "fallback").unwrap();
        assert_eq!(candidate.name, "count_vowels");
        assert_eq!(candidate.source, CODE);
    }

    #[test]
    fn bare_code_after_prose_is_cut_at_the_last_form() {
        let text = format!("The function is {} which counts vowels.", CODE);
        let candidate = parse_generated_tool(&text, "fallback").unwrap();
        assert_eq!(candidate.source, CODE);
    }

    #[test]
    fn helper_defs_are_kept_together() {
        let text = "(def vowels \"aeiou\")\n; counts\n(defn n_vowels [s] (count (filter (fn [c] (contains? vowels c)) (chars s))))\nDone.";
        let code = extract_code(text).unwrap();
        assert!(code.starts_with("(def vowels"));
        assert!(code.ends_with("(chars s))))"));
    }

    #[test]
    fn prose_without_code_is_rejected() {
        assert!(matches!(
            parse_generated_tool("I cannot help with that.", "x"),
            Err(IngestError::NoDefinition)
        ));
        assert!(matches!(parse_generated_tool("  \n", "x"), Err(IngestError::Empty)));
        assert_eq!(extract_code("no code here"), None);
    }

    #[test]
    fn definition_names() {
        assert_eq!(definition_name("(defn is-even? [n] true)"), Some("is-even?".into()));
        assert_eq!(definition_name("( def  total 1)"), Some("total".into()));
        assert_eq!(definition_name("(default 1)"), None);
    }

    #[test]
    fn json_objects_from_replies() {
        assert_eq!(
            parse_json_object(r#"{"a": 1}"#),
            Some(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            parse_json_object("text\n```json\n{\"b\": [1]}\n```\nmore"),
            Some(serde_json::json!({"b": [1]}))
        );
        assert_eq!(
            parse_json_object("Sure! {\"c\": true} hope that helps"),
            Some(serde_json::json!({"c": true}))
        );
        assert_eq!(parse_json_object("[1, 2]"), None);
        assert_eq!(parse_json_object("nothing"), None);
    }

    #[test]
    fn yaml_mappings_from_replies() {
        let plan = "solution: reverse it\ntools_used:\n  - name: reverse_string\n    args: [\"abc\"]\n";
        assert_eq!(
            parse_yaml_object(plan),
            Some(serde_json::json!({
                "solution": "reverse it",
                "tools_used": [{"name": "reverse_string", "args": ["abc"]}]
            }))
        );
        let fenced = format!("Plan below.\n```yaml\n{plan}```\nGood luck.");
        assert_eq!(parse_yaml_object(&fenced).unwrap()["solution"], "reverse it");
        assert_eq!(parse_yaml_object("just prose"), None);
    }
}
