use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::classifier::sources::ModelArtifacts;
use crate::error::{KeigoError, Result};

/// The subset of the encoder config this crate needs directly; the full
/// config is handed to candle untouched.
#[derive(Debug, Deserialize)]
struct EncoderDims {
    hidden_size: usize,
}

/// Frozen pretrained BERT encoder plus its tokenizer.
///
/// Used two ways: as the embedding stage under the fine-tuned
/// classification head at inference time, and as the frozen feature
/// extractor during head training.
pub struct Encoder {
    tokenizer: Tokenizer,
    model: BertModel,
    hidden_size: usize,
    max_length: usize,
    device: Device,
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("hidden_size", &self.hidden_size)
            .field("max_length", &self.max_length)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl Encoder {
    /// Loads the encoder and tokenizer from resolved artifacts.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::ModelLoadError` if the config or weights
    /// cannot be read, `KeigoError::TokenizerError` if the tokenizer
    /// fails to load.
    pub fn load(artifacts: &ModelArtifacts, max_length: usize, device: Device) -> Result<Self> {
        let config_str = std::fs::read_to_string(&artifacts.config)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| KeigoError::ModelLoadError(format!("invalid encoder config: {e}")))?;
        let dims: EncoderDims = serde_json::from_str(&config_str)
            .map_err(|e| KeigoError::ModelLoadError(format!("invalid encoder config: {e}")))?;

        let tokenizer = Tokenizer::from_file(&artifacts.tokenizer)
            .map_err(|e| KeigoError::TokenizerError(e.to_string()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&artifacts.encoder_weights], DTYPE, &device)
                .map_err(|e| KeigoError::ModelLoadError(e.to_string()))?
        };
        let model = BertModel::load(vb, &config)
            .map_err(|e| KeigoError::ModelLoadError(e.to_string()))?;

        tracing::debug!(hidden_size = dims.hidden_size, "encoder loaded");

        Ok(Self {
            tokenizer,
            model,
            hidden_size: dims.hidden_size,
            max_length,
            device,
        })
    }

    /// Encoder hidden dimension; the classification head's input width.
    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// One forward pass: tokenize, run the encoder, return the CLS
    /// embedding as a `[hidden_size]` tensor.
    ///
    /// # Errors
    ///
    /// Tokenization and model failures propagate as `KeigoError`.
    pub fn embed(&self, text: &str) -> Result<Tensor> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| KeigoError::TokenizerError(e.to_string()))?;

        let mut ids: Vec<u32> = encoding.get_ids().to_vec();
        ids.truncate(self.max_length);
        if ids.is_empty() {
            return Err(KeigoError::InferenceError(
                "tokenizer produced no tokens".into(),
            ));
        }
        let type_ids: Vec<u32> = encoding.get_type_ids()[..ids.len()].to_vec();

        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(type_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| KeigoError::InferenceError(e.to_string()))?;

        // CLS pooling: first token of the sequence output
        let cls = hidden.i((.., 0))?;
        Ok(cls.squeeze(0)?)
    }

    /// Embeds a batch of texts into a `[n, hidden_size]` tensor.
    ///
    /// Texts are embedded one at a time; the encoder is the throughput
    /// bottleneck either way on CPU.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Tensor> {
        let rows = texts
            .iter()
            .map(|t| self.embed(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Tensor::stack(&rows, 0)?)
    }
}
