//! Deterministic scorers for tests

use std::sync::Mutex;

use super::model::SequenceScorer;
use super::vocab::{Vocab, UNK_ID};
use super::window::ContextWindow;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

/// Predicts a fixed successor for the most recent token and records every
/// window it is asked to score
pub struct BigramScorer {
    vocab_size: usize,
    successors: FxHashMap<u32, u32>,
    seen: Mutex<Vec<ContextWindow>>,
}

impl BigramScorer {
    pub fn new(vocab: &Vocab, pairs: &[(&str, &str)]) -> Self {
        let successors = pairs
            .iter()
            .map(|&(from, to)| (vocab.encode(from), vocab.encode(to)))
            .collect();
        BigramScorer {
            vocab_size: vocab.len(),
            successors,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn windows(&self) -> Vec<ContextWindow> {
        self.seen.lock().unwrap().clone()
    }
}

impl SequenceScorer for BigramScorer {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn score(&self, window: &ContextWindow) -> Result<Vec<f32>> {
        self.seen.lock().unwrap().push(window.clone());

        let last = window.as_slice().last().copied().unwrap_or(UNK_ID);
        let next = self.successors.get(&last).copied().unwrap_or(UNK_ID);
        let mut scores = vec![0.0; self.vocab_size];
        scores[next as usize] = 1.0;
        Ok(scores)
    }
}

/// Always fails
pub struct FailingScorer;

impl SequenceScorer for FailingScorer {
    fn vocab_size(&self) -> usize {
        1
    }

    fn score(&self, _window: &ContextWindow) -> Result<Vec<f32>> {
        Err(Error::internal("scorer unavailable"))
    }
}
