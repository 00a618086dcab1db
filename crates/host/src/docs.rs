// crates/host/src/docs.rs

//! Markdown export of the registry.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use toolsmith_core::tool_registry::ToolRegistry;

/// Headings in output order with their name keywords. `other` catches the rest.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("string", &["string", "text", "str", "word", "char"]),
    ("math", &["math", "calc", "sum", "average", "mean", "median", "number"]),
    ("file", &["file", "read", "write", "path", "directory"]),
    ("data", &["data", "list", "array", "dict", "map", "filter", "sort", "find"]),
    ("utility", &["util", "helper", "convert", "format", "validate"]),
];

pub fn category_of(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map_or("other", |(category, _)| *category)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn render_documentation(registry: &ToolRegistry) -> String {
    let mut out = String::new();
    out.push_str("# Toolsmith Tools Documentation\n\n");
    let _ = writeln!(out, "Total tools: {}\n", registry.len());

    let headings = CATEGORIES.iter().map(|(c, _)| *c).chain(["other"]);
    for heading in headings {
        let mut names: Vec<&str> = registry
            .sources()
            .map(|(name, _)| name)
            .filter(|name| category_of(name) == heading)
            .collect();
        if names.is_empty() {
            continue;
        }
        names.sort_unstable();
        let _ = writeln!(out, "## {} Tools\n", capitalize(heading));
        for name in names {
            let source = registry.get_source(name).unwrap_or_default();
            let _ = writeln!(out, "### {name}\n");
            let _ = writeln!(out, "```clojure\n{}\n```\n", source.trim_end());
        }
    }
    out
}

pub fn export_documentation(registry: &ToolRegistry, path: &Path) -> Result<()> {
    fs::write(path, render_documentation(registry))
        .with_context(|| format!("failed to write documentation to {}", path.display()))?;
    info!(path = %path.display(), tools = registry.len(), "exported tools documentation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_keyword_order() {
        assert_eq!(category_of("reverse_string"), "string");
        assert_eq!(category_of("calculate_sum"), "math");
        assert_eq!(category_of("read_config"), "file");
        assert_eq!(category_of("sort_items"), "data");
        assert_eq!(category_of("validate_email"), "utility");
        assert_eq!(category_of("is_palindrome"), "other");
        // "str" wins before "file" is considered
        assert_eq!(category_of("stream_file"), "string");
    }

    #[test]
    fn renders_grouped_sorted_sections() {
        let mut registry = ToolRegistry::in_memory();
        registry.add("b", "(defn word_count [s: str] (len (split s)))").unwrap();
        registry.add("a", "(defn char_count [s: str] (len s))").unwrap();
        registry.add("c", "(defn average [xs: list] (/ (sum xs) (len xs)))").unwrap();

        let doc = render_documentation(&registry);
        assert!(doc.starts_with("# Toolsmith Tools Documentation\n\nTotal tools: 3\n"));
        let string_at = doc.find("## String Tools").unwrap();
        let math_at = doc.find("## Math Tools").unwrap();
        assert!(string_at < math_at);
        assert!(doc.find("### char_count").unwrap() < doc.find("### word_count").unwrap());
        assert!(doc.contains("```clojure\n(defn average [xs: list] (/ (sum xs) (len xs)))\n```"));
        assert!(!doc.contains("## Other Tools"));
    }

    #[test]
    fn export_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.md");
        let mut registry = ToolRegistry::in_memory();
        registry.add("x", "(defn helper_fn [] 1)").unwrap();
        export_documentation(&registry, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("## Utility Tools"));
    }
}
