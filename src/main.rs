//! Next-word prediction server
//!
//! Loads the vocabulary and LSTM weights once, then serves
//! `POST /predict` on `0.0.0.0:5000` by default.

use clap::Parser;
use nextword::llm::DEFAULT_MAX_WORDS;
use nextword::server::RouterBuilder;
use nextword::{InferenceContext, ServerConfig};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nextword")]
#[command(about = "Serve next-word predictions from a trained LSTM language model")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Path to model weights
    #[arg(short, long, default_value = "models/nextword_model.bin")]
    model: PathBuf,

    /// Path to vocabulary file
    #[arg(short, long, default_value = "models/vocab.json")]
    vocab: PathBuf,

    /// Maximum number of words appended per prediction
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Run on CPU even when an accelerator is available
    #[arg(long)]
    cpu: bool,

    /// Text predicted once at startup as a smoke test (empty to skip)
    #[arg(long, default_value = "virat kohli")]
    warmup_text: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            model_path: self.model.clone(),
            vocab_path: self.vocab.clone(),
            max_words: self.max_words,
            force_cpu: self.cpu,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.server_config();
    tracing::info!("nextword v{}", env!("CARGO_PKG_VERSION"));

    let context = match InferenceContext::load(&config) {
        Ok(context) => Arc::new(context),
        Err(e) => {
            tracing::error!(error = %e.format_chain(), "failed to load model");
            return Err(e.into());
        }
    };

    if !args.warmup_text.trim().is_empty() {
        let prediction = context.predict(&args.warmup_text)?;
        tracing::info!(
            input = %args.warmup_text,
            result = %prediction.text(),
            "warm-up prediction"
        );
    }

    let router = RouterBuilder::new().with_context(context).build()?;
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
