//! Held-out evaluation: accuracy, weighted precision/recall/F1, and a
//! confusion matrix, persisted as a text report, a JSON metrics object,
//! and a rendered PNG. Pure measurement; the model is never mutated.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use keigo_core::{ClassifierConfig, FormalityClassifier, ModelSource};
use serde::Serialize;

use crate::dataset::{self, stratified_split};

/// Fixed, ordered class-name sets for the two dataset schemes.
#[must_use]
pub fn default_class_names(num_labels: usize) -> Vec<String> {
    match num_labels {
        2 => vec!["Informal".into(), "Formal".into()],
        3 => vec!["Casual".into(), "Neutral".into(), "Polite".into()],
        n => (0..n).map(|i| format!("Class {i}")).collect(),
    }
}

/// Aggregate metrics persisted to `metrics.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision/recall/F1 with support.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Confusion matrix over a fixed, ordered set of class names.
/// Rows are actual classes, columns are predictions.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    class_names: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    #[must_use]
    pub fn new(class_names: Vec<String>) -> Self {
        let n = class_names.len();
        Self {
            class_names,
            counts: vec![vec![0; n]; n],
        }
    }

    /// Records one (actual, predicted) observation.
    ///
    /// # Errors
    ///
    /// Fails if either index falls outside the class set.
    pub fn record(&mut self, actual: usize, predicted: usize) -> Result<()> {
        let n = self.class_names.len();
        if actual >= n || predicted >= n {
            bail!("observation ({actual}, {predicted}) outside {n}-class matrix");
        }
        self.counts[actual][predicted] += 1;
        Ok(())
    }

    #[must_use]
    pub fn count(&self, actual: usize, predicted: usize) -> u64 {
        self.counts[actual][predicted]
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.class_names.len()).map(|i| self.counts[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Per-class metrics; zero denominators yield 0.0.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.class_names.len();
        (0..n)
            .map(|j| {
                let tp = self.counts[j][j] as f64;
                let predicted: u64 = (0..n).map(|i| self.counts[i][j]).sum();
                let support: u64 = self.counts[j].iter().sum();

                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp / predicted as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };

                ClassMetrics {
                    name: self.class_names[j].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Support-weighted precision/recall/F1 plus accuracy.
    #[must_use]
    pub fn weighted_metrics(&self) -> Metrics {
        let per_class = self.class_metrics();
        let total = self.total() as f64;

        let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
        if total > 0.0 {
            for class in &per_class {
                let weight = class.support as f64 / total;
                precision += weight * class.precision;
                recall += weight * class.recall;
                f1 += weight * class.f1;
            }
        }

        Metrics {
            accuracy: self.accuracy(),
            precision,
            recall,
            f1,
        }
    }

    /// Per-class table in the familiar scikit-learn layout, 4 digits.
    #[must_use]
    pub fn classification_report(&self) -> String {
        let width = self
            .class_names
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        let mut report = format!(
            "{:>width$}  precision    recall  f1-score   support\n\n",
            ""
        );

        for class in self.class_metrics() {
            report.push_str(&format!(
                "{:>width$}     {:.4}    {:.4}    {:.4}  {:>8}\n",
                class.name, class.precision, class.recall, class.f1, class.support
            ));
        }

        let metrics = self.weighted_metrics();
        report.push_str(&format!(
            "\n{:>width$}                          {:.4}  {:>8}\n",
            "accuracy",
            metrics.accuracy,
            self.total()
        ));
        report.push_str(&format!(
            "{:>width$}     {:.4}    {:.4}    {:.4}  {:>8}\n",
            "weighted avg",
            metrics.precision,
            metrics.recall,
            metrics.f1,
            self.total()
        ));

        report
    }

    /// Renders the matrix as a blue-intensity cell grid.
    ///
    /// # Errors
    ///
    /// Propagates image encoding and I/O failures.
    pub fn render_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        const CELL: u32 = 96;
        let n = self.class_names.len() as u32;
        let max = self.counts.iter().flatten().copied().max().unwrap_or(0);

        let mut img = image::RgbImage::from_pixel(n * CELL, n * CELL, image::Rgb([255, 255, 255]));

        for (i, row) in self.counts.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                let t = if max == 0 {
                    0.0
                } else {
                    count as f64 / max as f64
                };
                // White to dark blue, matching the usual "Blues" ramp
                let lerp = |lo: f64, hi: f64| (lo + t * (hi - lo)).round() as u8;
                let pixel = image::Rgb([lerp(247.0, 8.0), lerp(251.0, 48.0), lerp(255.0, 107.0)]);

                let (x0, y0) = (j as u32 * CELL, i as u32 * CELL);
                for y in y0..y0 + CELL {
                    for x in x0..x0 + CELL {
                        img.put_pixel(x, y, pixel);
                    }
                }
            }
        }

        img.save(path.as_ref())
            .with_context(|| format!("failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Persists the text report, `metrics.json`, and the rendered matrix
    /// into `dir`, returning the aggregate metrics.
    ///
    /// # Errors
    ///
    /// Propagates serialization and I/O failures.
    pub fn write_artifacts<P: AsRef<Path>>(&self, dir: P) -> Result<Metrics> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        std::fs::write(
            dir.join("classification_report.txt"),
            self.classification_report(),
        )?;

        let metrics = self.weighted_metrics();
        let json = serde_json::to_string_pretty(&metrics)?;
        std::fs::write(dir.join("metrics.json"), json)?;

        self.render_png(dir.join("confusion_matrix.png"))?;

        Ok(metrics)
    }
}

/// Configuration for a held-out evaluation pass.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Fine-tuned model to evaluate.
    pub model: ModelSource,
    /// Labeled dataset CSV.
    pub data_path: PathBuf,
    /// Where the report, metrics, and matrix image land.
    pub output_dir: PathBuf,
    /// Held-out fraction; must match the training split to reuse it.
    pub test_fraction: f32,
    /// Split seed; must match the training seed to reuse the split.
    pub seed: u64,
}

/// Runs the held-out split through the model and persists all artifacts.
///
/// # Errors
///
/// Fails on dataset or model loading problems, labels outside the
/// model's class set, or artifact write failures.
pub fn evaluate_model(config: &EvalConfig) -> Result<Metrics> {
    let classifier = FormalityClassifier::load(&config.model, ClassifierConfig::default())
        .context("failed to load model for evaluation")?;

    let records = dataset::load_labeled_csv(&config.data_path)?;
    let (_, test) = stratified_split(&records, config.test_fraction, config.seed)?;
    tracing::info!(held_out = test.len(), "evaluating");

    let mut matrix = ConfusionMatrix::new(classifier.class_names().to_vec());
    for record in &test {
        let scores = classifier.predict_scores(&record.text)?;
        let predicted = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        matrix.record(record.label as usize, predicted)?;
    }

    let metrics = matrix.write_artifacts(&config.output_dir)?;
    tracing::info!(
        accuracy = metrics.accuracy,
        f1 = metrics.f1,
        dir = %config.output_dir.display(),
        "evaluation artifacts written"
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_matrix() -> ConfusionMatrix {
        let mut m = ConfusionMatrix::new(default_class_names(2));
        // actual informal: 8 correct, 2 mispredicted formal
        for _ in 0..8 {
            m.record(0, 0).unwrap();
        }
        for _ in 0..2 {
            m.record(0, 1).unwrap();
        }
        // actual formal: 6 correct, 4 mispredicted informal
        for _ in 0..6 {
            m.record(1, 1).unwrap();
        }
        for _ in 0..4 {
            m.record(1, 0).unwrap();
        }
        m
    }

    #[test]
    fn accuracy_and_counts() {
        let m = binary_matrix();
        assert_eq!(m.total(), 20);
        assert_eq!(m.count(0, 0), 8);
        assert_eq!(m.count(1, 0), 4);
        assert!((m.accuracy() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn per_class_metrics() {
        let m = binary_matrix();
        let classes = m.class_metrics();

        // Informal: precision 8/12, recall 8/10
        assert!((classes[0].precision - 8.0 / 12.0).abs() < 1e-9);
        assert!((classes[0].recall - 0.8).abs() < 1e-9);
        assert_eq!(classes[0].support, 10);

        // Formal: precision 6/8, recall 6/10
        assert!((classes[1].precision - 0.75).abs() < 1e-9);
        assert!((classes[1].recall - 0.6).abs() < 1e-9);
    }

    #[test]
    fn weighted_metrics_average_by_support() {
        let m = binary_matrix();
        let metrics = m.weighted_metrics();
        let expected_precision = 0.5 * (8.0 / 12.0) + 0.5 * 0.75;
        assert!((metrics.precision - expected_precision).abs() < 1e-9);
        assert!(metrics.f1 > 0.0 && metrics.f1 < 1.0);
    }

    #[test]
    fn empty_matrix_yields_zero_metrics() {
        let m = ConfusionMatrix::new(default_class_names(3));
        let metrics = m.weighted_metrics();
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.f1, 0.0);
    }

    #[test]
    fn out_of_range_observation_fails() {
        let mut m = ConfusionMatrix::new(default_class_names(2));
        assert!(m.record(0, 2).is_err());
        assert!(m.record(2, 0).is_err());
    }

    #[test]
    fn report_names_every_class() {
        let m = binary_matrix();
        let report = m.classification_report();
        assert!(report.contains("Informal"));
        assert!(report.contains("Formal"));
        assert!(report.contains("weighted avg"));
        assert!(report.contains("accuracy"));
    }

    #[test]
    fn metrics_json_has_contract_keys() {
        let m = binary_matrix();
        let json = serde_json::to_value(m.weighted_metrics()).unwrap();
        for key in ["accuracy", "precision", "recall", "f1"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn artifacts_land_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let m = binary_matrix();
        m.write_artifacts(dir.path()).unwrap();

        assert!(dir.path().join("classification_report.txt").is_file());
        assert!(dir.path().join("metrics.json").is_file());
        assert!(dir.path().join("confusion_matrix.png").is_file());
    }

    #[test]
    fn class_name_defaults() {
        assert_eq!(default_class_names(2), vec!["Informal", "Formal"]);
        assert_eq!(
            default_class_names(3),
            vec!["Casual", "Neutral", "Polite"]
        );
        assert_eq!(default_class_names(4)[3], "Class 3");
    }
}
