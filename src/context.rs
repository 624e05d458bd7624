//! Process-wide inference context
//!
//! Built once at startup and shared read-only (behind an `Arc`) by every
//! request. Nothing in it is mutated after construction.

use std::fmt;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::llm::model::select_device;
use crate::llm::{predict, LstmScorer, Prediction, SequenceScorer, Vocab, WordTokenizer};

pub struct InferenceContext {
    tokenizer: WordTokenizer,
    vocab: Vocab,
    scorer: Box<dyn SequenceScorer>,
    max_words: usize,
}

impl InferenceContext {
    /// Assemble a context; the scorer must cover exactly the vocabulary
    pub fn new(vocab: Vocab, scorer: Box<dyn SequenceScorer>, max_words: usize) -> Result<Self> {
        if scorer.vocab_size() != vocab.len() {
            return Err(Error::InvalidModel(format!(
                "model scores {} tokens but the vocabulary has {}",
                scorer.vocab_size(),
                vocab.len()
            )));
        }

        Ok(InferenceContext {
            tokenizer: WordTokenizer::new()?,
            vocab,
            scorer,
            max_words,
        })
    }

    /// Load vocabulary and weights from the configured paths
    pub fn load(config: &ServerConfig) -> Result<Self> {
        let vocab = Vocab::load(&config.vocab_path)?;
        tracing::info!(
            path = %config.vocab_path.display(),
            tokens = vocab.len(),
            "vocabulary loaded"
        );

        let device = select_device(config.force_cpu);
        let scorer = LstmScorer::load(&config.model_path, device)?;
        tracing::info!(
            path = %config.model_path.display(),
            device = ?scorer.device(),
            embedding_dim = scorer.config().embedding_dim,
            hidden_dim = scorer.config().hidden_dim,
            "model loaded"
        );

        Self::new(vocab, Box::new(scorer), config.max_words)
    }

    /// Extend `text` with up to `max_words` predicted tokens
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        predict(
            &self.tokenizer,
            &self.vocab,
            self.scorer.as_ref(),
            text,
            self.max_words,
        )
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }
}

impl fmt::Debug for InferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceContext")
            .field("vocab_size", &self.vocab.len())
            .field("max_words", &self.max_words)
            .finish()
    }
}
