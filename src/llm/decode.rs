//! Autoregressive word-by-word decoding
//!
//! Each step encodes the full token history, windows its tail, scores it
//! and appends the arg-max token. Decoding stops early on the unknown
//! sentinel or on a period/comma.

use super::model::SequenceScorer;
use super::tokenizer::WordTokenizer;
use super::vocab::Vocab;
use super::window::ContextWindow;
use crate::error::Result;

/// Tokens appended per request unless configured otherwise
pub const DEFAULT_MAX_WORDS: usize = 3;

/// Predicted tokens that end decoding without being appended
const STOP_TOKENS: &[&str] = &[".", ","];

/// Why decoding ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `max_words` tokens were appended
    MaxWords,
    /// The scorer picked the unknown-token sentinel
    UnknownToken,
    /// The scorer picked a period or comma
    Punctuation(String),
}

impl StopReason {
    pub fn is_early(&self) -> bool {
        !matches!(self, StopReason::MaxWords)
    }
}

/// Result of one decoding run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
    /// Input tokens followed by the appended predictions
    pub tokens: Vec<String>,
    /// Number of tokens appended to the input
    pub appended: usize,
    pub stop: StopReason,
}

impl Prediction {
    /// Tokens joined with single spaces
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    /// Only the appended tokens
    pub fn continuation(&self) -> &[String] {
        &self.tokens[self.tokens.len() - self.appended..]
    }
}

/// Index of the highest score; ties go to the lowest index and NaN never wins
pub fn argmax(scores: &[f32]) -> Option<u32> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx as u32)
}

/// Extend `text` by up to `max_words` predicted tokens
pub fn predict(
    tokenizer: &WordTokenizer,
    vocab: &Vocab,
    scorer: &dyn SequenceScorer,
    text: &str,
    max_words: usize,
) -> Result<Prediction> {
    let mut tokens = tokenizer.tokenize(&text.to_lowercase());
    let input_len = tokens.len();
    let mut stop = StopReason::MaxWords;

    for step in 0..max_words {
        let ids = vocab.encode_all(tokens.as_slice());
        let window = ContextWindow::from_tail(&ids);

        let scores = scorer.score(&window).inspect_err(|e| {
            tracing::error!(step, error = %e.format_chain(), "scoring failed");
        })?;
        let predicted = argmax(&scores).unwrap_or(super::vocab::UNK_ID);

        if vocab.is_unknown(predicted) {
            tracing::debug!(step, id = predicted, "stopping on unknown token");
            stop = StopReason::UnknownToken;
            break;
        }

        let word = vocab.decode(predicted);
        if STOP_TOKENS.contains(&word) {
            tracing::debug!(step, token = word, "stopping on punctuation");
            stop = StopReason::Punctuation(word.to_string());
            break;
        }

        tracing::trace!(step, id = predicted, token = word, "appending token");
        tokens.push(word.to_string());
    }

    Ok(Prediction {
        appended: tokens.len() - input_len,
        tokens,
        stop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{BigramScorer, FailingScorer};
    use crate::llm::vocab::UNK_ID;
    use crate::llm::window::CONTEXT_WIDTH;

    fn tokenizer() -> WordTokenizer {
        WordTokenizer::new().unwrap()
    }

    fn cricket() -> (Vocab, BigramScorer) {
        let vocab = Vocab::from_tokens([
            "virat", "kohli", "is", "the", "best", "batsman", ".", ",", "rohit",
        ]);
        let scorer = BigramScorer::new(
            &vocab,
            &[
                ("virat", "kohli"),
                ("kohli", "is"),
                ("is", "the"),
                ("the", "best"),
                ("best", "batsman"),
                ("batsman", "."),
                ("rohit", ","),
            ],
        );
        (vocab, scorer)
    }

    #[test]
    fn test_argmax_ties_pick_lowest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_extends_up_to_max_words() {
        let (vocab, scorer) = cricket();
        let prediction = predict(&tokenizer(), &vocab, &scorer, "virat kohli", 3).unwrap();
        assert_eq!(prediction.text(), "virat kohli is the best");
        assert_eq!(prediction.appended, 3);
        assert_eq!(prediction.continuation(), &["is", "the", "best"]);
        assert_eq!(prediction.stop, StopReason::MaxWords);
    }

    #[test]
    fn test_never_exceeds_max_words() {
        let (vocab, scorer) = cricket();
        for max_words in 0..5 {
            let prediction = predict(&tokenizer(), &vocab, &scorer, "virat", max_words).unwrap();
            assert!(prediction.appended <= max_words);
        }
        let prediction = predict(&tokenizer(), &vocab, &scorer, "virat", 0).unwrap();
        assert_eq!(prediction.text(), "virat");
    }

    #[test]
    fn test_stops_on_period() {
        let (vocab, scorer) = cricket();
        let prediction = predict(&tokenizer(), &vocab, &scorer, "the best", 3).unwrap();
        assert_eq!(prediction.text(), "the best batsman");
        assert_eq!(prediction.stop, StopReason::Punctuation(".".to_string()));
        assert!(prediction.stop.is_early());
    }

    #[test]
    fn test_stops_on_comma() {
        let (vocab, scorer) = cricket();
        let prediction = predict(&tokenizer(), &vocab, &scorer, "Rohit", 3).unwrap();
        assert_eq!(prediction.text(), "rohit");
        assert_eq!(prediction.appended, 0);
    }

    #[test]
    fn test_unknown_words_return_input() {
        let (vocab, scorer) = cricket();
        let prediction =
            predict(&tokenizer(), &vocab, &scorer, "Football World-Cup!", 3).unwrap();
        assert_eq!(prediction.text(), "football world-cup !");
        assert_eq!(prediction.stop, StopReason::UnknownToken);
        assert_eq!(scorer.windows().len(), 1);
    }

    #[test]
    fn test_window_always_full_width() {
        let (vocab, scorer) = cricket();
        let inputs = [
            String::new(),
            "virat".to_string(),
            vec!["virat"; 23].join(" "),
            vec!["virat"; 1000].join(" "),
        ];
        for input in &inputs {
            predict(&tokenizer(), &vocab, &scorer, input, 3).unwrap();
        }
        let windows = scorer.windows();
        assert!(!windows.is_empty());
        assert!(windows.iter().all(|w| w.len() == CONTEXT_WIDTH));
    }

    #[test]
    fn test_window_tracks_appended_tokens() {
        let (vocab, scorer) = cricket();
        predict(&tokenizer(), &vocab, &scorer, "virat kohli", 2).unwrap();
        let windows = scorer.windows();
        assert_eq!(windows.len(), 2);
        let last = windows[1].as_slice();
        let expected = vocab.encode_all(&["virat", "kohli", "is"]);
        assert_eq!(&last[CONTEXT_WIDTH - 3..], expected.as_slice());
        assert_eq!(last[0], UNK_ID);
    }

    #[test]
    fn test_deterministic() {
        let (vocab, scorer) = cricket();
        let first = predict(&tokenizer(), &vocab, &scorer, "virat kohli", 3).unwrap();
        let second = predict(&tokenizer(), &vocab, &scorer, "virat kohli", 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scoring_failure_propagates() {
        let (vocab, _) = cricket();
        let err = predict(&tokenizer(), &vocab, &FailingScorer, "virat", 3).unwrap_err();
        assert!(err.to_string().contains("scorer unavailable"));
    }
}
