// ── Bridge Engine: Word Tokenizer ──────────────────────────────────────────
//
// Lowercased word-boundary tokenization shared by retrieval and compression.
// A token is a maximal run of Unicode word characters (letters, digits,
// underscore).

use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

/// Split `text` into lowercase word tokens, in order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}
