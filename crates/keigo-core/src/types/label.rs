use std::fmt;

use serde::{Deserialize, Serialize};

/// Three-way politeness register assigned by the heuristic labeler.
///
/// Stored as integers 0-2 in the pipeline CSV exchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolitenessLabel {
    /// Rough or slangy speech (ため口): casual pronouns, sentence-final particles.
    Casual,
    /// Plain or filler speech (普通): interjections, plain verb forms.
    Neutral,
    /// Honorific speech (敬語): polite copula, humble and respectful endings.
    Polite,
}

impl PolitenessLabel {
    /// Integer code used in the CSV exchange format.
    #[must_use]
    pub fn as_index(self) -> u8 {
        match self {
            Self::Casual => 0,
            Self::Neutral => 1,
            Self::Polite => 2,
        }
    }

    /// Parses the CSV integer code. Returns `None` for anything outside 0-2.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Casual),
            1 => Some(Self::Neutral),
            2 => Some(Self::Polite),
            _ => None,
        }
    }

    /// Collapses the three-way register into the binary formality scheme.
    ///
    /// Casual and Neutral fold to Informal; Polite maps to Formal. Total
    /// and deterministic over the whole domain.
    #[must_use]
    pub fn collapse(self) -> FormalityLabel {
        match self {
            Self::Casual | Self::Neutral => FormalityLabel::Informal,
            Self::Polite => FormalityLabel::Formal,
        }
    }
}

impl fmt::Display for PolitenessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Casual => write!(f, "casual"),
            Self::Neutral => write!(f, "neutral"),
            Self::Polite => write!(f, "polite"),
        }
    }
}

/// Binary formality class produced by collapsing [`PolitenessLabel`]
/// and predicted by the fine-tuned classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormalityLabel {
    /// Casual or plain speech.
    Informal,
    /// Honorific speech.
    Formal,
}

impl FormalityLabel {
    /// Integer code used in the binary CSV exchange format.
    #[must_use]
    pub fn as_index(self) -> u8 {
        match self {
            Self::Informal => 0,
            Self::Formal => 1,
        }
    }

    /// Parses the binary CSV integer code.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Informal),
            1 => Some(Self::Formal),
            _ => None,
        }
    }
}

impl fmt::Display for FormalityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informal => write!(f, "informal"),
            Self::Formal => write!(f, "formal"),
        }
    }
}

/// One row of the pipeline exchange format: a cleaned text block and an
/// optional politeness label. `None` means the heuristic abstained and
/// the row awaits manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Cleaned subtitle text.
    pub text: String,
    /// Heuristic label, or `None` for rows left to a human reviewer.
    pub label: Option<PolitenessLabel>,
}

impl LabeledExample {
    /// Creates an unlabeled example.
    #[must_use]
    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_is_total_and_deterministic() {
        assert_eq!(
            PolitenessLabel::Casual.collapse(),
            FormalityLabel::Informal
        );
        assert_eq!(
            PolitenessLabel::Neutral.collapse(),
            FormalityLabel::Informal
        );
        assert_eq!(PolitenessLabel::Polite.collapse(), FormalityLabel::Formal);
    }

    #[test]
    fn collapse_matches_integer_mapping() {
        // 0 -> 0, 1 -> 0, 2 -> 1
        for code in 0u8..=2 {
            let label = PolitenessLabel::from_index(code).unwrap();
            let expected = if code == 2 { 1 } else { 0 };
            assert_eq!(label.collapse().as_index(), expected);
        }
    }

    #[test]
    fn index_roundtrip() {
        for code in 0u8..=2 {
            let label = PolitenessLabel::from_index(code).unwrap();
            assert_eq!(label.as_index(), code);
        }
        assert_eq!(PolitenessLabel::from_index(3), None);
        assert_eq!(FormalityLabel::from_index(2), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(FormalityLabel::Formal.to_string(), "formal");
        assert_eq!(FormalityLabel::Informal.to_string(), "informal");
        assert_eq!(PolitenessLabel::Polite.to_string(), "polite");
    }

    #[test]
    fn labeled_example_is_serializable() {
        let ex = LabeledExample {
            text: "お願いいたします".into(),
            label: Some(PolitenessLabel::Polite),
        };
        let json = serde_json::to_string(&ex).unwrap();
        let back: LabeledExample = serde_json::from_str(&json).unwrap();
        assert_eq!(ex, back);
    }
}
