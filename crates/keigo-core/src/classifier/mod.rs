//! # Formality Classifier
//!
//! Candle-based inference over a fine-tuned BERT encoder with a linear
//! classification head. One synchronous forward pass per call, no retry;
//! a confidence threshold turns low-probability predictions into
//! abstentions instead of forcing a class.

pub mod encoder;
pub mod sources;

use candle_core::Device;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::DTYPE;
use serde::Deserialize;

use crate::error::{KeigoError, Result};
use crate::types::Verdict;

pub use encoder::Encoder;
pub use sources::{ModelArtifacts, ModelSource};

/// Default minimum predicted-class probability to accept a classification.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Default token truncation length.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Configuration for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Confidence threshold below which the classifier abstains.
    pub threshold: f32,
    /// Maximum token count per input; longer inputs are truncated.
    pub max_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ClassifierConfig {
    /// Create a new classifier configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold, clamped to `[0.0, 1.0]`.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the token truncation length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(1);
        self
    }
}

#[derive(Debug, Deserialize)]
struct LabelMetadata {
    class_names: Vec<String>,
}

/// Fine-tuned Japanese formality classifier.
#[derive(Debug)]
pub struct FormalityClassifier {
    encoder: Encoder,
    head: Linear,
    class_names: Vec<String>,
    config: ClassifierConfig,
}

impl FormalityClassifier {
    /// Loads a fine-tuned model from a hub repository id or a local run
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::ModelLoadError` if artifacts are missing,
    /// notably the `classifier.safetensors` head, which only exists after
    /// a training run.
    pub fn load(source: &ModelSource, config: ClassifierConfig) -> Result<Self> {
        let artifacts = source.resolve()?;
        let device = Device::Cpu;
        let encoder = Encoder::load(&artifacts, config.max_length, device.clone())?;

        let head_path = artifacts.head_weights.as_ref().ok_or_else(|| {
            KeigoError::ModelLoadError(format!(
                "{source} has no classifier.safetensors; run training first"
            ))
        })?;

        let class_names = match &artifacts.labels {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let meta: LabelMetadata = serde_json::from_str(&raw)
                    .map_err(|e| KeigoError::ModelLoadError(format!("invalid labels.json: {e}")))?;
                meta.class_names
            }
            None => vec!["Informal".to_string(), "Formal".to_string()],
        };

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[head_path], DTYPE, &device)
                .map_err(|e| KeigoError::ModelLoadError(e.to_string()))?
        };
        let head = candle_nn::linear(encoder.hidden_size(), class_names.len(), vb.pp("classifier"))
            .map_err(|e| KeigoError::ModelLoadError(e.to_string()))?;

        tracing::info!(source = %source, classes = ?class_names, "classifier loaded");

        Ok(Self {
            encoder,
            head,
            class_names,
            config,
        })
    }

    /// Ordered class names this model predicts over.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Softmax probabilities over the class set, in class-index order.
    ///
    /// # Errors
    ///
    /// Tokenization and inference failures propagate uncaught.
    pub fn predict_scores(&self, text: &str) -> Result<Vec<f32>> {
        let cls = self.encoder.embed(text)?;
        let logits = self
            .head
            .forward(&cls.unsqueeze(0)?)
            .map_err(|e| KeigoError::InferenceError(e.to_string()))?;
        let probs = candle_nn::ops::softmax_last_dim(&logits)?.squeeze(0)?;
        Ok(probs.to_vec1::<f32>()?)
    }

    /// Classifies one text, abstaining below the confidence threshold.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::EmptyInput` for empty or whitespace-only
    /// input; tokenization and inference failures propagate.
    pub fn predict(&self, text: &str) -> Result<Verdict> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(KeigoError::EmptyInput);
        }

        let scores = self.predict_scores(trimmed)?;
        Verdict::from_scores(trimmed, &scores, self.config.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_threshold_clamping() {
        let config = ClassifierConfig::new().with_threshold(1.5);
        assert_eq!(config.threshold, 1.0);

        let config = ClassifierConfig::new().with_threshold(-0.5);
        assert_eq!(config.threshold, 0.0);
    }

    #[test]
    fn config_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.max_length, DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn config_max_length_floor() {
        let config = ClassifierConfig::new().with_max_length(0);
        assert_eq!(config.max_length, 1);
    }

    #[test]
    fn load_without_head_fails_cleanly() {
        let tmp = std::env::temp_dir().join("keigo-headless-model");
        std::fs::create_dir_all(&tmp).unwrap();
        // Only a directory, no artifacts at all: resolution fails before
        // the head check, which is still a clean ModelLoadError.
        let err = FormalityClassifier::load(
            &ModelSource::LocalDir(tmp),
            ClassifierConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, KeigoError::ModelLoadError(_)));
    }
}
