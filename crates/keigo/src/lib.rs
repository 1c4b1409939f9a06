//! Umbrella crate for the Keigo formality pipeline.
//!
//! Re-exports the inference-side API from [`keigo_core`] and the training
//! and evaluation API from [`keigo_trainer`] under a single dependency.

pub use keigo_core::{
    BlockExtractor, ClassifierConfig, FormalityClassifier, HeuristicLabeler, KeigoError,
    ModelSource, TextCleaner, Verdict,
};
pub use keigo_core::types::{FormalityLabel, LabeledExample, PolitenessLabel};
pub use keigo_trainer::{evaluate_model, run_training, EvalConfig, TrainConfig, TrainOutcome};
