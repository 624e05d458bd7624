//! Next-word prediction service
//!
//! Serves word completions from a small LSTM language model trained on a
//! single-domain corpus. The model and vocabulary are loaded once into an
//! [`InferenceContext`] and shared read-only by every request.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod server;

pub use config::ServerConfig;
pub use context::InferenceContext;
pub use error::{Error, Result};
