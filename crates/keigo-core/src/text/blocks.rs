use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::error::Result;
use crate::text::clean::TextCleaner;

/// Reassembles subtitle cue text from an SRT-style line stream.
///
/// Runs a two-state machine over the lines: dialogue lines accumulate,
/// and a delimiter line (blank, purely numeric cue index, or timestamp
/// range) flushes the accumulator as one joined, cleaned block. Blocks
/// that clean down to nothing are discarded.
pub struct BlockExtractor {
    cleaner: TextCleaner,
    re_timestamp: Regex,
}

impl BlockExtractor {
    /// Constructs a new `BlockExtractor`.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            cleaner: TextCleaner::new()?,
            re_timestamp: Regex::new(r"\d{2}:\d{2}:\d{2},\d{3}")?,
        })
    }

    /// Extracts cleaned text blocks from a line reader.
    ///
    /// Lines accumulated after the final delimiter are dropped, matching
    /// the behavior of the upstream scraper this pipeline was built
    /// against. Well-formed SRT files end every cue with a blank line, so
    /// nothing is lost in practice.
    /// TODO: confirm with the data owners whether a trailing unterminated
    /// cue should be flushed instead of dropped.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::IoError` if a line fails to read.
    pub fn extract<R: BufRead>(&self, reader: R) -> Result<Vec<String>> {
        let mut blocks = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim().replace('\u{feff}', "").replace('～', "");

            if self.is_delimiter(&line) {
                if !current.is_empty() {
                    let joined = current.join(" ");
                    let cleaned = self.cleaner.clean(&joined);
                    if !cleaned.is_empty() {
                        blocks.push(cleaned);
                    }
                    current.clear();
                }
                continue;
            }

            current.push(line);
        }

        Ok(blocks)
    }

    /// Extracts cleaned text blocks from a subtitle file on disk.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::IoError` if the file cannot be opened or read.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let file = File::open(path)?;
        self.extract(BufReader::new(file))
    }

    fn is_delimiter(&self, line: &str) -> bool {
        line.is_empty()
            || line.chars().all(|c| c.is_ascii_digit())
            || self.re_timestamp.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn extractor() -> BlockExtractor {
        BlockExtractor::new().unwrap()
    }

    fn extract(input: &str) -> Vec<String> {
        extractor().extract(Cursor::new(input)).unwrap()
    }

    #[test]
    fn splits_srt_cues_into_blocks() {
        let srt = "1\n00:00:01,000 --> 00:00:03,000\nこんにちは\n\n2\n00:00:04,000 --> 00:00:06,000\nお願い\nいたします\n\n";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["こんにちは", "お願い いたします"]);
    }

    #[test]
    fn multiline_cue_joined_with_single_spaces() {
        let srt = "1\n00:00:01,000 --> 00:00:03,000\n一行目\n二行目\n三行目\n\n";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["一行目 二行目 三行目"]);
    }

    #[test]
    fn blocks_empty_after_cleaning_are_discarded() {
        let srt = "1\n00:00:01,000 --> 00:00:03,000\n(music) abc 123\n\n2\n00:00:04,000 --> 00:00:05,000\nまさか\n\n";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["まさか"]);
    }

    #[test]
    fn trailing_unflushed_block_is_dropped() {
        // No delimiter after the final cue text: the accumulator is
        // never flushed, so the last block is dropped.
        let srt = "1\n00:00:01,000 --> 00:00:03,000\n最初\n\n2\n00:00:04,000 --> 00:00:05,000\n最後のセリフ";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["最初"]);
    }

    #[test]
    fn bom_and_wave_dash_are_stripped() {
        let srt = "\u{feff}1\n00:00:01,000 --> 00:00:03,000\nえ～っと違う\n\n";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["えっと違う"]);
    }

    #[test]
    fn numeric_index_lines_never_leak_into_blocks() {
        let srt = "12\n00:01:01,000 --> 00:01:03,000\nそうだな\n\n13\n";
        let blocks = extract(srt);
        assert_eq!(blocks, vec!["そうだな"]);
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(extract("").is_empty());
        assert!(extract("\n\n\n").is_empty());
    }
}
