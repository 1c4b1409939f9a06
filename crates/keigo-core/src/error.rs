use thiserror::Error;

/// Errors that can occur during Keigo core operations.
#[derive(Debug, Error)]
pub enum KeigoError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// An I/O failure while reading subtitle files.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The model artifacts could not be resolved or loaded.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// The tokenizer failed to load or encode the input.
    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Candle ML framework error.
    #[error("ML inference error: {0}")]
    CandleError(String),
}

impl From<candle_core::Error> for KeigoError {
    fn from(e: candle_core::Error) -> Self {
        KeigoError::CandleError(e.to_string())
    }
}

/// Result type alias for Keigo operations.
pub type Result<T> = std::result::Result<T, KeigoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = KeigoError::EmptyInput;
        assert_eq!(err.to_string(), "input is empty or whitespace-only");

        let err = KeigoError::ModelLoadError("missing tokenizer.json".into());
        assert!(err.to_string().contains("missing tokenizer.json"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeigoError>();
    }
}
