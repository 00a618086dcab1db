// crates/core/tests/registry.rs

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;

use toolsmith_core::extract::extract;
use toolsmith_core::novelty::is_novel;
use toolsmith_core::script::Value;
use toolsmith_core::seeds::SEED_TOOLS;
use toolsmith_core::tool_registry::{RegistryError, ToolRegistry};

fn read_document(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn missing_file_is_seeded_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.json");

    let registry = ToolRegistry::open(&path);
    let seeds: Vec<String> = {
        let mut names: Vec<String> = SEED_TOOLS.iter().map(|(n, _)| n.to_string()).collect();
        names.sort();
        names
    };
    assert_eq!(registry.list(), seeds);

    let doc = read_document(&path);
    assert_eq!(doc.as_object().unwrap().len(), SEED_TOOLS.len());
}

#[test]
fn empty_document_is_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.json");
    fs::write(&path, "{}").unwrap();
    assert_eq!(ToolRegistry::open(&path).len(), SEED_TOOLS.len());
}

#[test]
fn corrupt_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.json");
    fs::write(
        &path,
        json!({
            "double": "(defn double [x: int] -> int (* 2 x))",
            "broken": "(defn broken [x] (+ x 1)",
            "renamed": "(defn other_name [] 1)",
            "not_code": 42,
            "two": "(defn a [] 1)\n(defn b [] 2)",
            "shout": "(defn shout [s: String] -> String (upper s))"
        })
        .to_string(),
    )
    .unwrap();

    let registry = ToolRegistry::open(&path);
    assert_eq!(registry.list(), vec!["double", "shout"]);
    assert_eq!(
        registry.execute("double", vec![Value::Int(21)]).unwrap(),
        Value::Int(42)
    );
    // hydrated sources are normalized like added ones
    assert_eq!(
        registry.get_source("shout"),
        Some("(defn shout [s: str] -> str (upper s))")
    );
}

#[test]
fn unparsable_document_falls_back_to_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.json");
    fs::write(&path, "{ this is not json").unwrap();
    let registry = ToolRegistry::open(&path);
    assert!(registry.contains("reverse_string"));
}

#[test]
fn every_mutation_is_written_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tools.json");
    let mut registry = ToolRegistry::open(&path);

    let name = registry
        .add("triple", "(defn triple [x: int] -> int (* 3 x))")
        .unwrap();
    assert_eq!(name, "triple");
    assert_eq!(
        read_document(&path)["triple"],
        json!("(defn triple [x: int] -> int (* 3 x))")
    );

    assert!(registry.remove("reverse_string").unwrap());
    let doc = read_document(&path);
    assert!(doc.get("reverse_string").is_none());

    let reopened = ToolRegistry::open(&path);
    assert_eq!(reopened.list(), registry.list());
}

#[test]
fn sources_round_trip_through_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::open(dir.path().join("tools.json"));
    registry
        .add("x", "(def greeting \"hi\")\n(defn greet [name: String] (str greeting \" \" name))")
        .unwrap();

    for name in registry.list() {
        let source = registry.get_source(&name).unwrap();
        let callable = extract(source).unwrap();
        assert_eq!(callable.name(), name);
    }
}

#[test]
fn registered_sources_are_never_novel() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ToolRegistry::open(dir.path().join("tools.json"));
    for (_, source) in registry.sources() {
        assert!(!is_novel(source, registry.sources().map(|(_, s)| s)));
    }
}

#[test]
fn failed_save_reverts_the_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store").join("tools.json");
    fs::create_dir(dir.path().join("store")).unwrap();
    let mut registry = ToolRegistry::open(&path);
    let before = registry.list();

    // the write goes through a temp file in the parent directory
    fs::remove_file(&path).unwrap();
    fs::remove_dir(dir.path().join("store")).unwrap();

    let err = registry.add("f", "(defn f [] 1)").unwrap_err();
    assert!(matches!(err, RegistryError::Persistence { .. }));
    assert!(!registry.contains("f"));

    let err = registry.remove("reverse_string").unwrap_err();
    assert!(matches!(err, RegistryError::Persistence { .. }));
    assert_eq!(registry.list(), before);
}
