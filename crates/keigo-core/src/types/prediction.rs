use std::fmt;

use serde::{Deserialize, Serialize};

use super::label::FormalityLabel;
use crate::error::{KeigoError, Result};

/// Outcome of a single classifier forward pass.
///
/// A prediction whose confidence falls below the configured threshold is
/// reported as [`Verdict::Unclassified`] instead of being forced into a
/// class. This is a designed branch, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// The arg-max class cleared the confidence threshold.
    Classified {
        /// Original input text.
        text: String,
        /// Predicted formality class.
        label: FormalityLabel,
        /// Predicted-class probability in `[0.0, 1.0]`.
        confidence: f32,
    },
    /// The arg-max probability fell below the threshold; abstain.
    Unclassified {
        /// Arg-max probability that was not high enough.
        confidence: f32,
    },
}

impl Verdict {
    /// Decides the verdict from softmax scores.
    ///
    /// Takes the arg-max class and its probability. Equality with the
    /// threshold classifies; only strictly lower confidence abstains.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::InferenceError` if `scores` is empty or the
    /// arg-max index has no binary-label mapping (model head with more
    /// than two classes).
    pub fn from_scores(text: &str, scores: &[f32], threshold: f32) -> Result<Self> {
        let (argmax, confidence) = scores
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| KeigoError::InferenceError("empty score vector".into()))?;

        if confidence < threshold {
            return Ok(Self::Unclassified { confidence });
        }

        let label = FormalityLabel::from_index(argmax as u8).ok_or_else(|| {
            KeigoError::InferenceError(format!(
                "class index {argmax} has no binary formality mapping"
            ))
        })?;

        Ok(Self::Classified {
            text: text.to_string(),
            label,
            confidence,
        })
    }

    /// Returns `true` if the verdict is a formal classification.
    #[must_use]
    pub fn is_formal(&self) -> bool {
        matches!(
            self,
            Self::Classified {
                label: FormalityLabel::Formal,
                ..
            }
        )
    }

    /// The arg-max probability, whether or not it cleared the threshold.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Classified { confidence, .. } | Self::Unclassified { confidence } => *confidence,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified { text, label, .. } => {
                write!(f, "{text} is {label} japanese")
            }
            Self::Unclassified { confidence } => {
                write!(
                    f,
                    "Not confident enough to classify - confidence: {confidence:.2}"
                )
            }
        }
    }
}
