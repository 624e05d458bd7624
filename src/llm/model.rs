//! Candle model loading and inference
//!
//! Handles:
//! - The LSTM next-word model (embedding → LSTM → linear head)
//! - Loading/saving trained weights as a bincode bundle
//! - Device selection (CUDA or Metal when available, CPU otherwise)

use candle_core::{DType, Device, Tensor};
use candle_nn::rnn::{lstm, LSTMConfig, LSTM, RNN};
use candle_nn::{embedding, linear, Embedding, Linear, Module, VarBuilder, VarMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::window::{ContextWindow, CONTEXT_WIDTH};
use crate::error::{Error, Result};

/// Opaque scoring function: one score per vocabulary id for a context window
pub trait SequenceScorer: Send + Sync {
    /// Size of the output space
    fn vocab_size(&self) -> usize;

    /// Score every vocabulary id as the continuation of `window`
    fn score(&self, window: &ContextWindow) -> Result<Vec<f32>>;
}

/// Model hyper-parameters, stored alongside the weights
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub context_width: usize,
}

impl ModelConfig {
    pub fn new(vocab_size: usize) -> Self {
        ModelConfig {
            vocab_size,
            embedding_dim: 100,
            hidden_dim: 150,
            context_width: CONTEXT_WIDTH,
        }
    }
}

/// Pick the compute device: accelerator when available, CPU otherwise
pub fn select_device(force_cpu: bool) -> Device {
    if force_cpu {
        return Device::Cpu;
    }

    // Use Metal GPU on macOS, CUDA elsewhere, fallback to CPU
    #[cfg(target_os = "macos")]
    let device = Device::new_metal(0).unwrap_or(Device::Cpu);
    #[cfg(not(target_os = "macos"))]
    let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);

    device
}

/// Embedding → single-layer LSTM → linear projection of the final hidden state
pub struct NextWordModel {
    config: ModelConfig,
    embedding: Embedding,
    lstm: LSTM,
    fc: Linear,
}

impl NextWordModel {
    pub fn new(config: ModelConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        let embedding = embedding(config.vocab_size, config.embedding_dim, vb.pp("embedding"))?;
        let lstm = lstm(
            config.embedding_dim,
            config.hidden_dim,
            LSTMConfig::default(),
            vb.pp("lstm"),
        )?;
        let fc = linear(config.hidden_dim, config.vocab_size, vb.pp("fc"))?;

        Ok(NextWordModel {
            config,
            embedding,
            lstm,
            fc,
        })
    }

    /// Input: (batch, seq_len) token ids → logits (batch, vocab_size)
    pub fn forward(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        let embedded = self.embedding.forward(input_ids)?;
        let states = self.lstm.seq(&embedded)?;
        let last = match states.last() {
            Some(state) => state,
            None => candle_core::bail!("cannot run the model on an empty sequence"),
        };
        self.fc.forward(&last.h)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

/// One named tensor, flattened
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TensorData {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Serialized weights file: config plus every named tensor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub config: ModelConfig,
    pub tensors: Vec<TensorData>,
}

impl ModelBundle {
    /// Snapshot every variable of a trained model
    pub fn from_varmap(config: ModelConfig, varmap: &VarMap) -> Result<Self> {
        let vars = varmap
            .data()
            .lock()
            .map_err(|_| Error::internal("variable map lock poisoned"))?;

        let mut tensors = Vec::with_capacity(vars.len());
        for (name, var) in vars.iter() {
            let shape = var.shape().dims().to_vec();
            let data = var
                .as_tensor()
                .flatten_all()?
                .to_dtype(DType::F32)?
                .to_vec1::<f32>()?;
            tensors.push(TensorData {
                name: name.clone(),
                shape,
                data,
            });
        }
        tensors.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ModelBundle { config, tensors })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)
            .map_err(|e| Error::serialization("failed to serialize model weights", e))?;
        fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        bincode::deserialize(&bytes)
            .map_err(|e| Error::serialization("failed to deserialize model weights", e))
    }

    /// Rebuild the model on `device`
    pub fn into_model(self, device: &Device) -> Result<NextWordModel> {
        if self.config.context_width != CONTEXT_WIDTH {
            return Err(Error::InvalidModel(format!(
                "trained for a context of {} tokens, expected {CONTEXT_WIDTH}",
                self.config.context_width
            )));
        }

        let mut named = HashMap::with_capacity(self.tensors.len());
        for tensor in self.tensors {
            let expected: usize = tensor.shape.iter().product();
            if expected != tensor.data.len() {
                return Err(Error::InvalidModel(format!(
                    "tensor {} has {} values for shape {:?}",
                    tensor.name,
                    tensor.data.len(),
                    tensor.shape
                )));
            }
            let value = Tensor::from_vec(tensor.data, tensor.shape, device)?;
            named.insert(tensor.name, value);
        }

        let vb = VarBuilder::from_tensors(named, DType::F32, device);
        NextWordModel::new(self.config, vb).map_err(|e| Error::InvalidModel(e.to_string()))
    }
}

/// Scorer backed by the trained LSTM
pub struct LstmScorer {
    model: NextWordModel,
    device: Device,
}

impl LstmScorer {
    pub fn new(model: NextWordModel, device: Device) -> Self {
        LstmScorer { model, device }
    }

    /// Load trained weights onto `device`
    pub fn load(weights_path: impl AsRef<Path>, device: Device) -> Result<Self> {
        let model = ModelBundle::load(weights_path)?.into_model(&device)?;
        Ok(LstmScorer { model, device })
    }

    pub fn config(&self) -> &ModelConfig {
        self.model.config()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl SequenceScorer for LstmScorer {
    fn vocab_size(&self) -> usize {
        self.model.config().vocab_size
    }

    fn score(&self, window: &ContextWindow) -> Result<Vec<f32>> {
        let input = Tensor::new(window.as_slice(), &self.device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input)?;
        let scores = logits.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_model(config: ModelConfig) -> (NextWordModel, VarMap) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = NextWordModel::new(config, vb).unwrap();
        (model, varmap)
    }

    fn small_config() -> ModelConfig {
        ModelConfig {
            vocab_size: 12,
            embedding_dim: 8,
            hidden_dim: 6,
            context_width: CONTEXT_WIDTH,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("nextword-{}-{}.bin", name, std::process::id()))
    }

    #[test]
    fn test_forward_shape() {
        let (model, _) = random_model(small_config());
        let input = Tensor::zeros((3, CONTEXT_WIDTH), DType::U32, &Device::Cpu).unwrap();
        let logits = model.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[3, 12]);
    }

    #[test]
    fn test_score_covers_vocab() {
        let (model, _) = random_model(small_config());
        let scorer = LstmScorer::new(model, Device::Cpu);
        let scores = scorer.score(&ContextWindow::from_tail(&[1, 2, 3])).unwrap();
        assert_eq!(scores.len(), scorer.vocab_size());
    }

    #[test]
    fn test_bundle_reload_preserves_scores() {
        let config = small_config();
        let (model, varmap) = random_model(config.clone());
        let window = ContextWindow::from_tail(&[4, 5, 6, 7]);
        let expected = LstmScorer::new(model, Device::Cpu).score(&window).unwrap();

        let path = temp_path("bundle");
        ModelBundle::from_varmap(config, &varmap).unwrap().save(&path).unwrap();
        let reloaded = LstmScorer::load(&path, Device::Cpu).unwrap();
        std::fs::remove_file(&path).ok();

        let actual = reloaded.score(&window).unwrap();
        for (a, e) in actual.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rejects_wrong_context_width() {
        let mut config = small_config();
        let (_, varmap) = random_model(config.clone());
        config.context_width = 10;
        let bundle = ModelBundle::from_varmap(config, &varmap).unwrap();
        assert!(matches!(
            bundle.into_model(&Device::Cpu),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_rejects_missing_tensor() {
        let config = small_config();
        let (_, varmap) = random_model(config.clone());
        let mut bundle = ModelBundle::from_varmap(config, &varmap).unwrap();
        bundle.tensors.retain(|t| !t.name.starts_with("fc."));
        assert!(matches!(
            bundle.into_model(&Device::Cpu),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_load_missing_weights() {
        let err = LstmScorer::load("/nonexistent/model.bin", Device::Cpu).err().unwrap();
        assert!(matches!(err, Error::Io { .. }));
    }
}
