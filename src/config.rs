//! Server configuration, resolved once at startup

use std::path::PathBuf;

use crate::llm::DEFAULT_MAX_WORDS;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path to the bincode weights bundle
    pub model_path: PathBuf,
    /// Path to the vocabulary JSON
    pub vocab_path: PathBuf,
    /// Tokens appended per prediction
    pub max_words: usize,
    /// Skip accelerator detection
    pub force_cpu: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from("models/nextword_model.bin"),
            vocab_path: PathBuf::from("models/vocab.json"),
            max_words: DEFAULT_MAX_WORDS,
            force_cpu: false,
        }
    }
}

impl ServerConfig {
    /// `host:port`, resolved by the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
