//! Model training binary for the next-word predictor
//!
//! Trains the LSTM language model on a plain-text corpus and writes the
//! vocabulary and weights the server loads.
//! Usage: cargo run --release --bin train -- --corpus data/cricket.txt --output models/

use candle_core::{DType, Device, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use clap::Parser;
use nextword::llm::corpus::{self, TrainingExample};
use nextword::llm::model::{select_device, ModelBundle, NextWordModel};
use nextword::llm::{ModelConfig, WordTokenizer, CONTEXT_WIDTH};
use rand::seq::SliceRandom;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train the next-word LSTM on a single-domain text corpus")]
struct Args {
    /// Path to training corpus (text file)
    #[arg(short, long)]
    corpus: PathBuf,

    /// Output directory for vocabulary and model weights
    #[arg(short, long, default_value = "models")]
    output: PathBuf,

    /// Number of training epochs
    #[arg(short, long, default_value = "50")]
    epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "32")]
    batch_size: usize,

    /// Learning rate
    #[arg(short, long, default_value = "0.001")]
    learning_rate: f64,

    /// Embedding dimension
    #[arg(long, default_value = "100")]
    embedding_dim: usize,

    /// LSTM hidden dimension
    #[arg(long, default_value = "150")]
    hidden_dim: usize,

    /// Train on CPU even when an accelerator is available
    #[arg(long)]
    cpu: bool,
}

/// Stack a batch into (batch, CONTEXT_WIDTH) inputs and (batch,) targets
fn batch_tensors(batch: &[TrainingExample], device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
    let inputs: Vec<u32> = batch
        .iter()
        .flat_map(|example| example.window.as_slice().iter().copied())
        .collect();
    let targets: Vec<u32> = batch.iter().map(|example| example.target).collect();

    Ok((
        Tensor::from_vec(inputs, (batch.len(), CONTEXT_WIDTH), device)?,
        Tensor::from_vec(targets, batch.len(), device)?,
    ))
}

/// One optimisation step, returning the batch loss
fn train_step(
    model: &NextWordModel,
    optimizer: &mut AdamW,
    inputs: &Tensor,
    targets: &Tensor,
) -> candle_core::Result<f32> {
    let logits = model.forward(inputs)?;
    let loss = loss::cross_entropy(&logits, targets)?;
    optimizer.backward_step(&loss)?;
    loss.to_vec0::<f32>()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.batch_size == 0 {
        return Err("batch size must be at least 1".into());
    }

    // Load and clean corpus
    let text = fs::read_to_string(&args.corpus).map_err(|e| nextword::Error::io(&args.corpus, e))?;
    let tokenizer = WordTokenizer::new()?;
    let sentences = corpus::clean_sentences(&text)?;
    tracing::info!(
        path = %args.corpus.display(),
        bytes = text.len(),
        sentences = sentences.len(),
        "corpus loaded"
    );

    // Vocabulary and examples
    let vocab = corpus::build_vocab(&sentences, &tokenizer);
    let mut examples = corpus::training_examples(&sentences, &tokenizer, &vocab);
    if examples.is_empty() {
        return Err("corpus produced no training examples".into());
    }
    tracing::info!(
        vocab_size = vocab.len(),
        examples = examples.len(),
        "training data prepared"
    );

    // Model and optimizer
    let device = select_device(args.cpu);
    let config = ModelConfig {
        vocab_size: vocab.len(),
        embedding_dim: args.embedding_dim,
        hidden_dim: args.hidden_dim,
        context_width: CONTEXT_WIDTH,
    };
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let model = NextWordModel::new(config.clone(), vb)?;

    // Zero weight decay: plain Adam
    let mut optimizer = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: args.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        },
    )?;
    tracing::info!(device = ?device, epochs = args.epochs, "training started");

    let start_time = Instant::now();
    let mut rng = rand::thread_rng();

    for epoch in 1..=args.epochs {
        let epoch_start = Instant::now();
        examples.shuffle(&mut rng);

        let mut total_loss = 0.0;
        let mut batch_count = 0;
        for batch in examples.chunks(args.batch_size) {
            let (inputs, targets) = batch_tensors(batch, &device)?;
            total_loss += train_step(&model, &mut optimizer, &inputs, &targets)?;
            batch_count += 1;
        }

        tracing::info!(
            epoch,
            total_loss = %format!("{total_loss:.4}"),
            mean_loss = %format!("{:.4}", total_loss / batch_count as f32),
            secs = %format!("{:.2}", epoch_start.elapsed().as_secs_f32()),
            "epoch finished"
        );
    }
    tracing::info!(
        secs = %format!("{:.2}", start_time.elapsed().as_secs_f32()),
        "training complete"
    );

    // Save vocabulary and weights
    fs::create_dir_all(&args.output).map_err(|e| nextword::Error::io(&args.output, e))?;
    let vocab_path = args.output.join("vocab.json");
    vocab.save(&vocab_path)?;
    let model_path = args.output.join("nextword_model.bin");
    ModelBundle::from_varmap(config, &varmap)?.save(&model_path)?;

    tracing::info!(
        vocab = %vocab_path.display(),
        model = %model_path.display(),
        "artifacts written"
    );

    Ok(())
}
