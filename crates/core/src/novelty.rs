// crates/core/src/novelty.rs

//! Lexical near-duplicate detection.
//!
//! Sources are compared as whitespace-token sets, so reordering or repeating
//! tokens does not make a candidate look new. Crude on purpose; it stands in
//! for semantic comparison.

use std::collections::HashSet;

/// Jaccard similarity at or above this marks a candidate as a duplicate.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

fn tokens(source: &str) -> HashSet<&str> {
    source.split_whitespace().collect()
}

/// Jaccard similarity of the two sources' token sets, in `[0, 1]`.
/// Two sources without any tokens score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// True when `candidate` is below the threshold against every existing source.
pub fn is_novel<'a, I>(candidate: &str, existing: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .all(|other| similarity(candidate, other) < SIMILARITY_THRESHOLD)
}
