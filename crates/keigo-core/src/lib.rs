//! # Keigo Core
//!
//! The heart of the Keigo formality pipeline. Provides subtitle text
//! cleaning, heuristic politeness labeling, label collapsing, and
//! candle-based formality inference for Japanese text.
//!
//! ## Quick Start
//!
//! ```rust
//! use keigo_core::label::HeuristicLabeler;
//! use keigo_core::types::{FormalityLabel, PolitenessLabel};
//!
//! let labeler = HeuristicLabeler::new().unwrap();
//! let label = labeler.label("こちらを見てください").unwrap();
//!
//! assert_eq!(label, PolitenessLabel::Polite);
//! assert_eq!(label.collapse(), FormalityLabel::Formal);
//! ```
pub mod classifier;
pub mod error;
pub mod label;
pub mod text;
pub mod types;

// Re-export primary API
pub use classifier::{ClassifierConfig, Encoder, FormalityClassifier, ModelArtifacts, ModelSource};
pub use error::{KeigoError, Result};
pub use label::HeuristicLabeler;
pub use text::{BlockExtractor, TextCleaner};
pub use types::{FormalityLabel, LabeledExample, PolitenessLabel, Verdict};
