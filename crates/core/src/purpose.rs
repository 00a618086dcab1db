// crates/core/src/purpose.rs

//! Name-based guess at what a tool is for.
//!
//! The guess only steers which literal values the input synthesizer picks
//! and which failures the harness tolerates. It never changes arity.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Filter,
    File,
    List,
    String,
    Math,
    Unclassified,
}

const FILTER_WORDS: &[&str] = &["filter"];
const FILE_WORDS: &[&str] = &["file", "read", "write", "path", "directory"];
const LIST_WORDS: &[&str] = &["list", "array", "filter", "map", "sort", "find"];
const STRING_WORDS: &[&str] = &["string", "text", "str", "word", "char"];
const MATH_WORDS: &[&str] = &["calc", "math", "sum", "product", "average", "mean", "median"];

/// Classification order; the first matching purpose wins.
const PRIORITY: &[Purpose] = &[
    Purpose::Filter,
    Purpose::File,
    Purpose::List,
    Purpose::String,
    Purpose::Math,
];

impl Purpose {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Purpose::Filter => FILTER_WORDS,
            Purpose::File => FILE_WORDS,
            Purpose::List => LIST_WORDS,
            Purpose::String => STRING_WORDS,
            Purpose::Math => MATH_WORDS,
            Purpose::Unclassified => &[],
        }
    }

    /// Whether `name` carries any of this purpose's keywords, regardless of
    /// which purpose [`classify`] would pick.
    pub fn describes(self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords().iter().any(|word| name.contains(word))
    }
}

pub fn classify(name: &str) -> Purpose {
    PRIORITY
        .iter()
        .copied()
        .find(|purpose| purpose.describes(name))
        .unwrap_or(Purpose::Unclassified)
}
