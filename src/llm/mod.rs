//! LLM Module: tokenization, vocabulary, model inference and decoding
//!
//! # Components
//! - `tokenizer.rs`: Treebank-style word tokenizer
//! - `vocab.rs`: Word-level vocabulary with the unknown sentinel
//! - `window.rs`: Fixed-width context window
//! - `model.rs`: Candle LSTM scorer and weight bundles
//! - `decode.rs`: Autoregressive next-word decoding loop
//! - `corpus.rs`: Corpus cleaning and training example generation

pub mod corpus;
pub mod decode;
pub mod model;
pub mod tokenizer;
pub mod vocab;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use decode::{predict, Prediction, StopReason, DEFAULT_MAX_WORDS};
pub use model::{LstmScorer, ModelConfig, SequenceScorer};
pub use tokenizer::WordTokenizer;
pub use vocab::Vocab;
pub use window::{ContextWindow, CONTEXT_WIDTH};
