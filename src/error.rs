//! Error taxonomy shared by the library, the server and the training tool
//!
//! Client errors map to 400 responses, everything else to 500 (or a fatal
//! startup failure when it happens while loading the context).

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing 'text' key in request body")]
    MissingText,
    #[error("Input text is empty")]
    EmptyText,
    #[error("{0}")]
    BadRequest(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid vocabulary: {0}")]
    InvalidVocab(String),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("failed to compile tokenizer rule: {0}")]
    Tokenizer(#[from] regex::Error),
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
    #[error("{context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: BoxError,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingText | Self::EmptyText | Self::BadRequest(_)
        )
    }

    pub fn format_chain(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = std::error::Error::source(err);
        }
        chain.join(" | caused by: ")
    }
}
