//! CSV loading and stratified splitting for the pipeline exchange format.
//!
//! Every stage reads and writes the same row shape: a `text` (or
//! `sentence`) column plus an integer `label` column, where an empty
//! label marks a row awaiting manual review.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use keigo_core::types::{LabeledExample, PolitenessLabel};

/// A fully labeled training row. The label is a raw class index so the
/// same loader serves the 3-class and the collapsed binary datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    pub label: u8,
}

fn text_column(headers: &csv::StringRecord) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("text") || h.eq_ignore_ascii_case("sentence"))
}

fn label_column(headers: &csv::StringRecord) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case("label"))
}

/// Loads a fully labeled dataset, skipping rows whose label is blank.
///
/// # Errors
///
/// Fails if the file is missing, the text/sentence or label column is
/// absent, or a non-blank label does not parse as an integer.
pub fn load_labeled_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let text_idx =
        text_column(&headers).context("dataset has no `text` or `sentence` column")?;
    let label_idx = label_column(&headers).context("dataset has no `label` column")?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let text = record.get(text_idx).unwrap_or("").trim();
        let raw_label = record.get(label_idx).unwrap_or("").trim();

        if text.is_empty() || raw_label.is_empty() {
            skipped += 1;
            continue;
        }

        let label: u8 = raw_label
            .parse()
            .with_context(|| format!("row {}: invalid label {raw_label:?}", row + 2))?;

        records.push(Record {
            text: text.to_string(),
            label,
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped rows with blank text or label");
    }
    if records.is_empty() {
        bail!("dataset {} has no labeled rows", path.display());
    }

    Ok(records)
}

/// Reads the 3-class exchange format into [`LabeledExample`] rows,
/// preserving blank labels as `None`.
///
/// # Errors
///
/// Fails on a missing text column or a non-blank label outside 0-2.
pub fn read_examples<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledExample>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let text_idx =
        text_column(&headers).context("dataset has no `text` or `sentence` column")?;
    let label_idx = label_column(&headers);

    let mut examples = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let text = record.get(text_idx).unwrap_or("").trim().to_string();

        let label = match label_idx.map(|i| record.get(i).unwrap_or("").trim()) {
            None | Some("") => None,
            Some(raw) => {
                let code: u8 = raw
                    .parse()
                    .with_context(|| format!("row {}: invalid label {raw:?}", row + 2))?;
                Some(PolitenessLabel::from_index(code).with_context(|| {
                    format!("row {}: politeness label out of range: {code}", row + 2)
                })?)
            }
        };

        examples.push(LabeledExample { text, label });
    }

    Ok(examples)
}

/// Writes rows in the exchange format; `None` labels become blank cells.
///
/// # Errors
///
/// Propagates CSV and I/O failures.
pub fn write_records<P: AsRef<Path>>(path: P, rows: &[(String, Option<u8>)]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(["text", "label"])?;
    for (text, label) in rows {
        let label = label.map(|l| l.to_string()).unwrap_or_default();
        writer.write_record([text.as_str(), label.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes [`LabeledExample`] rows in the 3-class exchange format.
pub fn write_examples<P: AsRef<Path>>(path: P, examples: &[LabeledExample]) -> Result<()> {
    let rows: Vec<(String, Option<u8>)> = examples
        .iter()
        .map(|ex| (ex.text.clone(), ex.label.map(PolitenessLabel::as_index)))
        .collect();
    write_records(path, &rows)
}

/// Splits records into train and held-out sets, preserving per-class
/// proportions.
///
/// # Errors
///
/// Fails on degenerate stratification: a class with fewer than two
/// members cannot be split.
pub fn stratified_split(
    records: &[Record],
    test_fraction: f32,
    seed: u64,
) -> Result<(Vec<Record>, Vec<Record>)> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        bail!("test fraction must be in (0.0, 1.0), got {test_fraction}");
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        by_class.entry(record.label).or_default().push(i);
    }

    let mut rng = oorandom::Rand64::new(seed as u128);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (label, mut indices) in by_class {
        if indices.len() < 2 {
            bail!(
                "class {label} has only {} member(s); cannot stratify",
                indices.len()
            );
        }

        // Fisher-Yates
        for i in (1..indices.len()).rev() {
            let j = rng.rand_range(0..(i as u64 + 1)) as usize;
            indices.swap(i, j);
        }

        let n_test = ((indices.len() as f32 * test_fraction).round() as usize)
            .clamp(1, indices.len() - 1);

        for (pos, idx) in indices.into_iter().enumerate() {
            if pos < n_test {
                test.push(records[idx].clone());
            } else {
                train.push(records[idx].clone());
            }
        }
    }

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_labeled_accepts_text_or_sentence_column() {
        let file = csv_file("text,label\nこんにちは,2\nお前,0\n");
        let records = load_labeled_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, 2);

        let file = csv_file("sentence,label\nこんにちは,1\n");
        let records = load_labeled_csv(file.path()).unwrap();
        assert_eq!(records[0].text, "こんにちは");
    }

    #[test]
    fn load_labeled_skips_blank_labels() {
        let file = csv_file("text,label\nです,2\n未定,\n");
        let records = load_labeled_csv(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn load_labeled_missing_label_column_fails() {
        let file = csv_file("text\nです\n");
        let err = load_labeled_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn load_labeled_missing_file_fails() {
        assert!(load_labeled_csv("/nonexistent/dataset.csv").is_err());
    }

    #[test]
    fn load_labeled_invalid_label_fails() {
        let file = csv_file("text,label\nです,polite\n");
        assert!(load_labeled_csv(file.path()).is_err());
    }

    #[test]
    fn examples_roundtrip_preserves_blank_labels() {
        use keigo_core::types::PolitenessLabel;

        let examples = vec![
            LabeledExample {
                text: "お願いします".into(),
                label: Some(PolitenessLabel::Polite),
            },
            LabeledExample::unlabeled("曖昧な文"),
        ];

        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write_examples(file.path(), &examples).unwrap();
        let back = read_examples(file.path()).unwrap();
        assert_eq!(back, examples);
    }

    fn sample_records() -> Vec<Record> {
        let mut records = Vec::new();
        for i in 0..40 {
            records.push(Record {
                text: format!("informal {i}"),
                label: 0,
            });
        }
        for i in 0..10 {
            records.push(Record {
                text: format!("formal {i}"),
                label: 1,
            });
        }
        records
    }

    #[test]
    fn stratified_split_preserves_class_proportions() {
        let records = sample_records();
        let (train, test) = stratified_split(&records, 0.2, 42).unwrap();

        assert_eq!(train.len() + test.len(), records.len());
        assert_eq!(test.iter().filter(|r| r.label == 0).count(), 8);
        assert_eq!(test.iter().filter(|r| r.label == 1).count(), 2);
    }

    #[test]
    fn stratified_split_is_seeded() {
        let records = sample_records();
        let (_, test_a) = stratified_split(&records, 0.2, 7).unwrap();
        let (_, test_b) = stratified_split(&records, 0.2, 7).unwrap();
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn degenerate_class_fails_to_split() {
        let mut records = sample_records();
        records.push(Record {
            text: "唯一".into(),
            label: 2,
        });
        let err = stratified_split(&records, 0.2, 42).unwrap_err();
        assert!(err.to_string().contains("cannot stratify"));
    }

    #[test]
    fn invalid_fraction_fails() {
        let records = sample_records();
        assert!(stratified_split(&records, 0.0, 42).is_err());
        assert!(stratified_split(&records, 1.0, 42).is_err());
    }
}
