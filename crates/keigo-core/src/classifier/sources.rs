use std::path::{Path, PathBuf};

use crate::error::{KeigoError, Result};

/// Where a model's artifacts live.
///
/// The trained model is published under an external hub repository
/// identifier and reloaded by that identifier at inference time; a local
/// run directory works the same way during development. The identifier is
/// the sole contract between training and serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Hugging Face Hub repository id, e.g. `"david-rb/japanese-formality-classifier"`.
    HubRepo(String),
    /// Local directory produced by a training run.
    LocalDir(PathBuf),
}

impl ModelSource {
    /// Interprets a CLI-style string: an existing directory wins,
    /// anything else is treated as a hub repository id.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let path = Path::new(s);
        if path.is_dir() {
            Self::LocalDir(path.to_path_buf())
        } else {
            Self::HubRepo(s.to_string())
        }
    }

    /// Resolves the source into concrete artifact paths, downloading
    /// from the hub when needed.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::ModelLoadError` if a required artifact
    /// (encoder config, tokenizer, encoder weights) cannot be resolved.
    pub fn resolve(&self) -> Result<ModelArtifacts> {
        match self {
            Self::HubRepo(repo_id) => {
                tracing::info!(repo = %repo_id, "resolving model from hub");
                let api = hf_hub::api::sync::Api::new()
                    .map_err(|e| KeigoError::ModelLoadError(e.to_string()))?;
                let repo = api.model(repo_id.clone());

                let fetch = |name: &str| {
                    repo.get(name).map_err(|e| {
                        KeigoError::ModelLoadError(format!("{repo_id}/{name}: {e}"))
                    })
                };

                Ok(ModelArtifacts {
                    config: fetch("config.json")?,
                    tokenizer: fetch("tokenizer.json")?,
                    encoder_weights: fetch("model.safetensors")?,
                    head_weights: repo.get("classifier.safetensors").ok(),
                    labels: repo.get("labels.json").ok(),
                })
            }
            Self::LocalDir(dir) => {
                let require = |name: &str| {
                    let path = dir.join(name);
                    if path.is_file() {
                        Ok(path)
                    } else {
                        Err(KeigoError::ModelLoadError(format!(
                            "missing {name} in {}",
                            dir.display()
                        )))
                    }
                };
                let optional = |name: &str| {
                    let path = dir.join(name);
                    path.is_file().then_some(path)
                };

                Ok(ModelArtifacts {
                    config: require("config.json")?,
                    tokenizer: require("tokenizer.json")?,
                    encoder_weights: require("model.safetensors")?,
                    head_weights: optional("classifier.safetensors"),
                    labels: optional("labels.json"),
                })
            }
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HubRepo(id) => write!(f, "{id}"),
            Self::LocalDir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Concrete on-disk artifact paths for one model.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    /// Encoder `config.json`.
    pub config: PathBuf,
    /// `tokenizer.json`.
    pub tokenizer: PathBuf,
    /// Pretrained encoder weights (`model.safetensors`).
    pub encoder_weights: PathBuf,
    /// Fine-tuned classification head (`classifier.safetensors`), absent
    /// for a bare pretrained encoder.
    pub head_weights: Option<PathBuf>,
    /// Class-name metadata (`labels.json`), absent for a bare encoder.
    pub labels: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_existing_directory() {
        let tmp = std::env::temp_dir();
        let source = ModelSource::parse(tmp.to_str().unwrap());
        assert!(matches!(source, ModelSource::LocalDir(_)));
    }

    #[test]
    fn parse_falls_back_to_hub_repo() {
        let source = ModelSource::parse("david-rb/japanese-formality-classifier");
        assert_eq!(
            source,
            ModelSource::HubRepo("david-rb/japanese-formality-classifier".into())
        );
        assert_eq!(
            source.to_string(),
            "david-rb/japanese-formality-classifier"
        );
    }

    #[test]
    fn resolve_local_dir_reports_missing_artifacts() {
        let tmp = std::env::temp_dir().join("keigo-empty-model-dir");
        std::fs::create_dir_all(&tmp).unwrap();
        let err = ModelSource::LocalDir(tmp).resolve().unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
