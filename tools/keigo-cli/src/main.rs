//! Keigo Pipeline CLI
//!
//! Drives the data side of the formality pipeline (subtitle extraction,
//! heuristic labeling, label collapsing) and serves as the interactive
//! classification surface: one text in, a verdict string and an
//! info/warning banner out.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keigo_core::types::{LabeledExample, PolitenessLabel};
use keigo_core::{BlockExtractor, ClassifierConfig, FormalityClassifier, HeuristicLabeler, ModelSource};
use keigo_trainer::dataset;
use tracing::{info, warn};
use walkdir::WalkDir;

/// CLI arguments
#[derive(Parser)]
#[command(name = "keigo")]
#[command(about = "Japanese text-formality pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract cleaned text blocks from a raw subtitle tree into an
    /// unlabeled CSV
    Extract {
        /// Root directory: one subdirectory per genre, subtitle files below
        #[arg(short, long, env = "KEIGO_SUBTITLE_DIR")]
        input: PathBuf,
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
        /// Cap on episodes taken per genre
        #[arg(long)]
        limit_per_genre: Option<usize>,
    },
    /// Assign heuristic politeness labels, leaving ambiguous rows blank
    Label {
        /// Unlabeled CSV
        #[arg(short, long)]
        input: PathBuf,
        /// Semi-labeled output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Collapse 3-class politeness labels into binary formality labels
    Collapse {
        /// 3-class labeled CSV
        #[arg(short, long)]
        input: PathBuf,
        /// Binary output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Classify text as formal or informal with the fine-tuned model
    Classify {
        /// Fine-tuned model: run directory or hub repo id
        #[arg(short, long, env = "KEIGO_MODEL")]
        model: String,
        /// Confidence threshold below which the classifier abstains
        #[arg(short, long, default_value_t = 0.5)]
        threshold: f32,
        /// Text to classify; omit for an interactive prompt
        text: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            limit_per_genre,
        } => extract(&input, &output, limit_per_genre),
        Commands::Label { input, output } => label(&input, &output),
        Commands::Collapse { input, output } => collapse(&input, &output),
        Commands::Classify {
            model,
            threshold,
            text,
        } => classify(&model, threshold, text),
    }
}

fn extract(input: &PathBuf, output: &PathBuf, limit_per_genre: Option<usize>) -> Result<()> {
    let extractor = BlockExtractor::new()?;
    let mut examples: Vec<LabeledExample> = Vec::new();

    let genres = std::fs::read_dir(input)
        .with_context(|| format!("failed to read subtitle root {}", input.display()))?;

    for genre in genres {
        let genre = genre?;
        if !genre.file_type()?.is_dir() {
            continue;
        }

        let mut episodes = 0usize;
        for entry in WalkDir::new(genre.path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if limit_per_genre.is_some_and(|limit| episodes >= limit) {
                break;
            }

            let blocks = extractor
                .extract_file(entry.path())
                .with_context(|| format!("failed to extract {}", entry.path().display()))?;
            info!(
                file = %entry.path().display(),
                blocks = blocks.len(),
                "extracted"
            );
            examples.extend(blocks.into_iter().map(LabeledExample::unlabeled));
            episodes += 1;
        }
    }

    dataset::write_examples(output, &examples)?;
    info!(rows = examples.len(), output = %output.display(), "unlabeled dataset written");
    Ok(())
}

fn label(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let labeler = HeuristicLabeler::new()?;
    let mut examples = dataset::read_examples(input)?;

    let mut distribution: BTreeMap<Option<PolitenessLabel>, usize> = BTreeMap::new();
    for example in &mut examples {
        example.label = labeler.label(&example.text);
        *distribution.entry(example.label).or_default() += 1;
    }

    dataset::write_examples(output, &examples)?;

    for (label, count) in &distribution {
        match label {
            Some(l) => info!(label = %l, count, "labeled"),
            None => info!(count, "left for manual review"),
        }
    }
    info!(rows = examples.len(), output = %output.display(), "semi-labeled dataset written");
    Ok(())
}

fn collapse(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let examples = dataset::read_examples(input)?;

    let mut rows: Vec<(String, Option<u8>)> = Vec::with_capacity(examples.len());
    let mut skipped = 0usize;
    for example in examples {
        match example.label {
            Some(label) => rows.push((example.text, Some(label.collapse().as_index()))),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "unlabeled rows skipped; label them before collapsing");
    }

    dataset::write_records(output, &rows)?;
    info!(rows = rows.len(), output = %output.display(), "binary dataset written");
    Ok(())
}

fn classify(model: &str, threshold: f32, text: Option<String>) -> Result<()> {
    let source = ModelSource::parse(model);
    let config = ClassifierConfig::new().with_threshold(threshold);
    let classifier =
        FormalityClassifier::load(&source, config).context("failed to load classifier")?;

    match text {
        Some(text) => render_verdict(&classifier, &text),
        None => {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                write!(stdout, "Input your Japanese sentence: ")?;
                stdout.flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    return Ok(());
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                render_verdict(&classifier, line)?;
            }
        }
    }
}

fn render_verdict(classifier: &FormalityClassifier, text: &str) -> Result<()> {
    let verdict = classifier.predict(text)?;
    println!("Prediction: {verdict}");

    match &verdict {
        v if v.is_formal() => info!("This sentence uses polite/formal language."),
        keigo_core::Verdict::Classified { .. } => {
            warn!("This sentence uses informal or casual language.")
        }
        keigo_core::Verdict::Unclassified { confidence } => {
            warn!(confidence = *confidence, "below the confidence threshold")
        }
    }
    Ok(())
}
