//! Word tokenizer: Penn Treebank conventions
//!
//! Handles:
//! - Splitting punctuation, brackets and quotes into their own tokens
//! - Splitting contractions (`don't` -> `do n't`, `cannot` -> `can not`)
//! - Whitespace tokenization of the rewritten text
//!
//! The rules are fixed and locale independent, so the server tokenizes
//! input exactly the way the training tool tokenized the corpus.

use regex::Regex;

use crate::error::Result;

/// Rewrite rules applied before the leading/trailing space is added
const LEADING_RULES: &[(&str, &str)] = &[
    // starting quotes
    (r#"^""#, "``"),
    (r"(``)", " $1 "),
    (r#"([ (\[{<])("|'{2})"#, "$1 `` "),
    // punctuation
    (r"([:,])([^\d])", " $1 $2"),
    (r"([:,])$", " $1 "),
    (r"\.\.\.", " ... "),
    (r"[;@#$%&]", " $0 "),
    (r#"([^\.])(\.)([\]\)}>"']*)\s*$"#, "$1 $2$3 "),
    (r"[?!]", " $0 "),
    (r"([^'])' ", "$1 ' "),
    // brackets
    (r"[\]\[\(\)\{\}<>]", " $0 "),
    // double dashes
    (r"--", " -- "),
];

/// Rewrite rules applied to the space-padded text
const TRAILING_RULES: &[(&str, &str)] = &[
    // ending quotes
    (r"''", " '' "),
    (r#"""#, " '' "),
    (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "$1 $2 "),
    (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "$1 $2 "),
    // contractions
    (r"(?i)\b(can)(not)\b", " $1 $2 "),
    (r"(?i)\b(d)('ye)\b", " $1 $2 "),
    (r"(?i)\b(gim)(me)\b", " $1 $2 "),
    (r"(?i)\b(gon)(na)\b", " $1 $2 "),
    (r"(?i)\b(got)(ta)\b", " $1 $2 "),
    (r"(?i)\b(lem)(me)\b", " $1 $2 "),
    (r"(?i)\b(more)('n)\b", " $1 $2 "),
    (r"(?i)\b(wan)(na)\s", " $1 $2 "),
    (r"(?i) ('t)(is)\b", " $1 $2 "),
    (r"(?i) ('t)(was)\b", " $1 $2 "),
];

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(rules: &[(&str, &'static str)]) -> Result<Vec<Rule>> {
    rules
        .iter()
        .map(|&(pattern, replacement)| {
            Ok(Rule {
                pattern: Regex::new(pattern)?,
                replacement,
            })
        })
        .collect()
}

/// Treebank-style word tokenizer
pub struct WordTokenizer {
    leading: Vec<Rule>,
    trailing: Vec<Rule>,
}

impl WordTokenizer {
    /// Compile the rule set
    pub fn new() -> Result<Self> {
        Ok(WordTokenizer {
            leading: compile(LEADING_RULES)?,
            trailing: compile(TRAILING_RULES)?,
        })
    }

    /// Split text into word and punctuation tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut text = text.to_string();
        for rule in &self.leading {
            text = rule
                .pattern
                .replace_all(&text, rule.replacement)
                .into_owned();
        }

        let mut text = format!(" {text} ");
        for rule in &self.trailing {
            text = rule
                .pattern
                .replace_all(&text, rule.replacement)
                .into_owned();
        }

        text.split_whitespace().map(str::to_string).collect()
    }
}
