//! Fine-tunes a linear classification head over frozen encoder CLS
//! embeddings. Tokenization and the encoder forward pass stay inside
//! candle; this module owns the split, the optimization loop, and the
//! best-checkpoint selection by weighted F1.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{loss, Module, Optimizer, VarBuilder, VarMap};
use keigo_core::{Encoder, ModelSource};

use crate::dataset::{self, stratified_split, Record};
use crate::eval::{default_class_names, ConfusionMatrix, Metrics};
use crate::runs;

/// Everything a training run needs, injected explicitly; no stage reads
/// paths from anywhere else.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Labeled dataset CSV (`text`/`sentence` + `label`).
    pub data_path: PathBuf,
    /// Root under which the run directory is created.
    pub output_root: PathBuf,
    /// Pretrained encoder: hub repository id or local snapshot directory.
    pub encoder_id: String,
    /// Number of target classes (2 for the collapsed binary scheme).
    pub num_labels: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Held-out fraction for the stratified split.
    pub test_fraction: f32,
    /// Seed for the split and batch shuffling.
    pub seed: u64,
    /// Token truncation length.
    pub max_length: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/processed/labeled.csv"),
            output_root: PathBuf::from("models"),
            encoder_id: "tohoku-nlp/bert-base-japanese-v3".to_string(),
            num_labels: 2,
            epochs: 5,
            batch_size: 16,
            learning_rate: 1e-3,
            test_fraction: 0.2,
            seed: 42,
            max_length: 512,
        }
    }
}

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Directory holding the reloadable model artifacts.
    pub run_dir: PathBuf,
    /// Weighted F1 of the checkpoint that was kept.
    pub best_f1: f64,
    /// Epoch (1-based) that produced the kept checkpoint.
    pub best_epoch: usize,
    /// Held-out metrics of the kept checkpoint.
    pub best_metrics: Metrics,
}

/// Runs the full training driver: load, split, embed, fit, checkpoint.
///
/// # Errors
///
/// Surfaces dataset problems (missing path, missing label column,
/// degenerate stratification), encoder loading failures, and candle
/// errors from the optimization loop.
pub fn run_training(config: &TrainConfig) -> Result<TrainOutcome> {
    let records = dataset::load_labeled_csv(&config.data_path)?;
    for record in &records {
        if usize::from(record.label) >= config.num_labels {
            bail!(
                "label {} out of range for {} classes",
                record.label,
                config.num_labels
            );
        }
    }

    let (train, test) = stratified_split(&records, config.test_fraction, config.seed)?;
    tracing::info!(
        train = train.len(),
        held_out = test.len(),
        encoder = %config.encoder_id,
        "starting training"
    );

    let device = Device::Cpu;
    let source = ModelSource::parse(&config.encoder_id);
    let artifacts = source.resolve().context("failed to resolve encoder")?;
    let encoder = Encoder::load(&artifacts, config.max_length, device.clone())
        .context("failed to load encoder")?;

    // Frozen feature extraction: one pass over each split, detached so
    // the optimization loop never walks back into the encoder graph.
    tracing::info!("embedding training split");
    let train_x = embed_records(&encoder, &train)?.detach();
    let train_y = label_tensor(&train, &device)?;
    tracing::info!("embedding held-out split");
    let test_x = embed_records(&encoder, &test)?.detach();
    let test_labels: Vec<u8> = test.iter().map(|r| r.label).collect();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let head = candle_nn::linear(encoder.hidden_size(), config.num_labels, vb.pp("classifier"))?;
    let mut optimizer = candle_nn::AdamW::new(
        varmap.all_vars(),
        candle_nn::ParamsAdamW {
            lr: config.learning_rate,
            ..Default::default()
        },
    )?;

    let run_dir = runs::create_run_dir(&config.output_root)?;
    let class_names = default_class_names(config.num_labels);
    let head_path = run_dir.join("classifier.safetensors");

    let mut rng = oorandom::Rand64::new(config.seed as u128);
    let mut best_f1 = f64::NEG_INFINITY;
    let mut best_epoch = 0;
    let mut best_metrics = None;

    for epoch in 1..=config.epochs {
        let mut indices: Vec<u32> = (0..train.len() as u32).collect();
        for i in (1..indices.len()).rev() {
            let j = rng.rand_range(0..(i as u64 + 1)) as usize;
            indices.swap(i, j);
        }

        let mut epoch_loss = 0.0f32;
        let mut batches = 0usize;
        for chunk in indices.chunks(config.batch_size) {
            let idx = Tensor::new(chunk, &device)?;
            let xs = train_x.index_select(&idx, 0)?;
            let ys = train_y.index_select(&idx, 0)?;

            let logits = head.forward(&xs)?;
            let batch_loss = loss::cross_entropy(&logits, &ys)?;
            optimizer.backward_step(&batch_loss)?;

            epoch_loss += batch_loss.to_scalar::<f32>()?;
            batches += 1;
        }
        let mean_loss = epoch_loss / batches.max(1) as f32;

        // Held-out pass selects the checkpoint by weighted F1.
        let metrics = held_out_metrics(&head, &test_x, &test_labels, &class_names)?;
        tracing::info!(
            epoch,
            loss = mean_loss,
            accuracy = metrics.accuracy,
            f1 = metrics.f1,
            "epoch complete"
        );

        if metrics.f1 > best_f1 {
            best_f1 = metrics.f1;
            best_epoch = epoch;
            best_metrics = Some(metrics);
            varmap.save(&head_path)?;
            tracing::info!(epoch, f1 = best_f1, "checkpoint saved");
        }
    }

    let best_metrics =
        best_metrics.context("training produced no evaluable checkpoint")?;

    persist_encoder_artifacts(&artifacts, &run_dir)?;
    write_labels(&run_dir, &class_names)?;
    tracing::info!(dir = %run_dir.display(), best_epoch, f1 = best_f1, "training complete");

    Ok(TrainOutcome {
        run_dir,
        best_f1,
        best_epoch,
        best_metrics,
    })
}

fn embed_records(encoder: &Encoder, records: &[Record]) -> Result<Tensor> {
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    Ok(encoder.embed_batch(&texts)?)
}

fn label_tensor(records: &[Record], device: &Device) -> Result<Tensor> {
    let labels: Vec<u32> = records.iter().map(|r| u32::from(r.label)).collect();
    Ok(Tensor::new(labels.as_slice(), device)?)
}

fn held_out_metrics(
    head: &candle_nn::Linear,
    test_x: &Tensor,
    test_labels: &[u8],
    class_names: &[String],
) -> Result<Metrics> {
    let logits = head.forward(test_x)?;
    let predictions = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;

    let mut matrix = ConfusionMatrix::new(class_names.to_vec());
    for (actual, predicted) in test_labels.iter().zip(&predictions) {
        matrix.record(usize::from(*actual), *predicted as usize)?;
    }
    Ok(matrix.weighted_metrics())
}

/// Copies the pretrained encoder snapshot next to the trained head so
/// the run directory reloads standalone through `ModelSource::LocalDir`.
fn persist_encoder_artifacts(
    artifacts: &keigo_core::ModelArtifacts,
    run_dir: &Path,
) -> Result<()> {
    std::fs::copy(&artifacts.config, run_dir.join("config.json"))?;
    std::fs::copy(&artifacts.tokenizer, run_dir.join("tokenizer.json"))?;
    std::fs::copy(&artifacts.encoder_weights, run_dir.join("model.safetensors"))?;
    Ok(())
}

fn write_labels(run_dir: &Path, class_names: &[String]) -> Result<()> {
    let json = serde_json::json!({ "class_names": class_names });
    std::fs::write(
        run_dir.join("labels.json"),
        serde_json::to_string_pretty(&json)?,
    )?;
    Ok(())
}
