//! Held-out evaluation entry point: writes the classification report,
//! metrics JSON, and the confusion-matrix image.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use keigo_core::ModelSource;
use keigo_trainer::{evaluate_model, EvalConfig};
use tracing::info;

/// Evaluate a fine-tuned formality model on the held-out split.
#[derive(Parser)]
#[command(name = "evaluate")]
#[command(about = "Evaluate the Keigo formality classifier")]
#[command(version)]
struct Cli {
    /// Fine-tuned model: run directory or hub repo id
    #[arg(short, long, env = "KEIGO_MODEL")]
    model: String,

    /// Labeled dataset CSV used for training
    #[arg(short, long, env = "KEIGO_DATA")]
    data: PathBuf,

    /// Where the artifacts land
    #[arg(short, long, env = "KEIGO_EVAL_DIR", default_value = "eval")]
    output: PathBuf,

    /// Held-out fraction; match the value used at training time
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f32,

    /// Split seed; match the value used at training time
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = EvalConfig {
        model: ModelSource::parse(&cli.model),
        data_path: cli.data,
        output_dir: cli.output,
        test_fraction: cli.test_fraction,
        seed: cli.seed,
    };

    let metrics = evaluate_model(&config)?;
    info!(
        accuracy = metrics.accuracy,
        precision = metrics.precision,
        recall = metrics.recall,
        f1 = metrics.f1,
        "evaluation complete"
    );
    Ok(())
}
