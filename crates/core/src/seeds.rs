// crates/core/src/seeds.rs

//! Tools every fresh registry starts with.

pub const REVERSE_STRING: &str = r#"(defn reverse_string [text: str] -> str
  "Reverse the input string, returning the characters of text in the opposite order."
  (let [reversed (reverse text)]
    reversed))
"#;

pub const CALCULATE_SUM: &str = r#"(defn calculate_sum [numbers: list[float]] -> float
  "Calculate the sum of a list of numbers."
  (sum numbers))
"#;

/// `(name, source)` pairs in seeding order.
pub const SEED_TOOLS: &[(&str, &str)] = &[
    ("reverse_string", REVERSE_STRING),
    ("calculate_sum", CALCULATE_SUM),
];
