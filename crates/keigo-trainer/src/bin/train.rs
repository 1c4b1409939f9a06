//! Classification-head fine-tuning entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use keigo_trainer::{run_training, TrainConfig};
use tracing::info;

/// Fine-tune the formality classification head on a labeled dataset.
#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Fine-tune the Keigo formality classifier")]
#[command(version)]
struct Cli {
    /// Labeled dataset CSV (text/sentence + label columns)
    #[arg(short, long, env = "KEIGO_DATA")]
    data: PathBuf,

    /// Root directory for run outputs
    #[arg(short, long, env = "KEIGO_OUTPUT_ROOT", default_value = "models")]
    output_root: PathBuf,

    /// Pretrained encoder: hub repo id or local snapshot directory
    #[arg(
        short,
        long,
        env = "KEIGO_ENCODER",
        default_value = "tohoku-nlp/bert-base-japanese-v3"
    )]
    encoder: String,

    /// Number of target classes (2 = collapsed binary scheme)
    #[arg(long, default_value_t = 2)]
    num_labels: usize,

    #[arg(long, default_value_t = 5)]
    epochs: usize,

    #[arg(long, default_value_t = 16)]
    batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Held-out fraction for the stratified split
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f32,

    /// Seed for the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Token truncation length
    #[arg(long, default_value_t = 512)]
    max_length: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = TrainConfig {
        data_path: cli.data,
        output_root: cli.output_root,
        encoder_id: cli.encoder,
        num_labels: cli.num_labels,
        epochs: cli.epochs,
        batch_size: cli.batch_size,
        learning_rate: cli.learning_rate,
        test_fraction: cli.test_fraction,
        seed: cli.seed,
        max_length: cli.max_length,
    };

    let outcome = run_training(&config)?;
    info!(
        run_dir = %outcome.run_dir.display(),
        best_epoch = outcome.best_epoch,
        f1 = outcome.best_f1,
        accuracy = outcome.best_metrics.accuracy,
        "model saved"
    );
    Ok(())
}
