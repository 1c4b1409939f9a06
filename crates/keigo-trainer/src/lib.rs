//! # Keigo Trainer
//!
//! Batch workflows for the formality pipeline: dataset loading and
//! stratified splitting, classification-head fine-tuning over a frozen
//! pretrained encoder, and held-out evaluation with persisted artifacts.

pub mod dataset;
pub mod eval;
pub mod runs;
pub mod trainer;

pub use dataset::{load_labeled_csv, read_examples, stratified_split, write_examples, Record};
pub use eval::{default_class_names, evaluate_model, ConfusionMatrix, EvalConfig, Metrics};
pub use runs::{create_run_dir, RunId};
pub use trainer::{run_training, TrainConfig, TrainOutcome};
