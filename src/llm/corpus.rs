//! Corpus preparation for training
//!
//! Handles:
//! - Sentence segmentation of raw text
//! - Cleaning (ASCII letters only, collapsed whitespace, lowercase)
//! - Vocabulary construction in discovery order
//! - Prefix → next-token examples over fixed-width windows

use regex::Regex;

use super::tokenizer::WordTokenizer;
use super::vocab::Vocab;
use super::window::ContextWindow;
use crate::error::Result;

/// One supervised example: context window and the id that follows it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingExample {
    pub window: ContextWindow,
    pub target: u32,
}

/// Split raw text after sentence-final punctuation
pub fn split_sentences(text: &str) -> Result<Vec<String>> {
    let boundary = Regex::new(r#"[.!?]+["')\]]*\s+"#)?;

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in boundary.find_iter(text) {
        sentences.push(text[start..m.end()].trim().to_string());
        start = m.end();
    }
    sentences.push(text[start..].trim().to_string());
    sentences.retain(|s| !s.is_empty());

    Ok(sentences)
}

/// Sentences reduced to lowercase ASCII words separated by single spaces
pub fn clean_sentences(text: &str) -> Result<Vec<String>> {
    let non_letters = Regex::new(r"[^a-zA-Z\s]")?;
    let whitespace = Regex::new(r"\s+")?;

    let cleaned = split_sentences(text)?
        .into_iter()
        .map(|sentence| {
            let letters = non_letters.replace_all(&sentence, "");
            whitespace
                .replace_all(&letters, " ")
                .trim()
                .to_lowercase()
        })
        .filter(|sentence| !sentence.is_empty())
        .collect();

    Ok(cleaned)
}

/// Vocabulary over every token of the cleaned sentences
pub fn build_vocab(sentences: &[String], tokenizer: &WordTokenizer) -> Vocab {
    Vocab::from_tokens(sentences.iter().flat_map(|s| tokenizer.tokenize(s)))
}

/// Every prefix of at least two tokens becomes one example
pub fn training_examples(
    sentences: &[String],
    tokenizer: &WordTokenizer,
    vocab: &Vocab,
) -> Vec<TrainingExample> {
    let mut examples = Vec::new();
    for sentence in sentences {
        let ids = vocab.encode_all(tokenizer.tokenize(sentence).as_slice());
        for end in 1..ids.len() {
            examples.push(TrainingExample {
                window: ContextWindow::from_tail(&ids[..end]),
                target: ids[end],
            });
        }
    }
    examples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::vocab::UNK_ID;
    use crate::llm::window::CONTEXT_WIDTH;

    const CORPUS: &str = "Virat Kohli is an Indian batsman. He captained India!\n\
                          Kohli scored 50 centuries?  Remarkable";

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences(CORPUS).unwrap();
        assert_eq!(
            sentences,
            vec![
                "Virat Kohli is an Indian batsman.",
                "He captained India!",
                "Kohli scored 50 centuries?",
                "Remarkable",
            ]
        );
    }

    #[test]
    fn test_clean_sentences() {
        let cleaned = clean_sentences(CORPUS).unwrap();
        assert_eq!(
            cleaned,
            vec![
                "virat kohli is an indian batsman",
                "he captained india",
                "kohli scored centuries",
                "remarkable",
            ]
        );
        assert!(clean_sentences("123. !!!").unwrap().is_empty());
    }

    #[test]
    fn test_vocab_and_examples() {
        let tokenizer = WordTokenizer::new().unwrap();
        let sentences = clean_sentences(CORPUS).unwrap();
        let vocab = build_vocab(&sentences, &tokenizer);
        assert_eq!(vocab.encode("virat"), 1);
        assert_eq!(vocab.encode("kohli"), 2);

        let examples = training_examples(&sentences, &tokenizer, &vocab);
        // 5 + 2 + 2 + 0 prefixes
        assert_eq!(examples.len(), 9);

        let first = &examples[0];
        assert_eq!(first.target, vocab.encode("kohli"));
        assert_eq!(first.window.as_slice()[CONTEXT_WIDTH - 1], vocab.encode("virat"));
        assert_eq!(first.window.as_slice()[CONTEXT_WIDTH - 2], UNK_ID);
    }
}
