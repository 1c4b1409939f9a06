use regex::Regex;

use crate::error::Result;

/// Cleans one raw subtitle line into plain dialogue text.
///
/// Strips narrator annotations in bracket pairs, decorative symbols,
/// and Latin alphanumeric runs; normalizes full-width spaces and
/// collapses whitespace. Pure and idempotent: cleaning twice yields
/// the same result as once.
pub struct TextCleaner {
    re_annotation: Regex,
    re_symbols: Regex,
    re_ascii: Regex,
    re_whitespace: Regex,
}

impl TextCleaner {
    /// Constructs a new `TextCleaner` with pre-compiled regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Narrator/SFX annotations: 《...》, （...）, (...)
            re_annotation: Regex::new(r"[《（(].*?[）》)]")?,
            re_symbols: Regex::new(r"[♪※◆★☆【】→←◯△×●]")?,
            re_ascii: Regex::new(r"[a-zA-Z0-9]")?,
            re_whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Cleans a single line. May return an empty string.
    #[must_use]
    pub fn clean(&self, line: &str) -> String {
        let line = self.re_annotation.replace_all(line, "");
        let line = self.re_symbols.replace_all(&line, "");
        // ASCII removal can leave adjacent spaces, so it runs before the
        // whitespace collapse to keep cleaning idempotent
        let line = self.re_ascii.replace_all(&line, "");
        let line = line.replace('\u{3000}', " ");
        let line = self.re_whitespace.replace_all(&line, " ");
        line.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> TextCleaner {
        TextCleaner::new().unwrap()
    }

    #[test]
    fn strips_narrator_annotations() {
        let c = cleaner();
        assert_eq!(c.clean("《ナレーション》こんにちは"), "こんにちは");
        assert_eq!(c.clean("（笑）そうですね"), "そうですね");
        assert_eq!(c.clean("(sfx)まさか"), "まさか");
    }

    #[test]
    fn strips_decorative_symbols() {
        let c = cleaner();
        let cleaned = c.clean("♪※◆★☆【】→←◯△×●ようこそ");
        assert_eq!(cleaned, "ようこそ");
        for ch in "♪※◆★☆【】→←◯△×●".chars() {
            assert!(!cleaned.contains(ch));
        }
    }

    #[test]
    fn strips_ascii_alphanumerics() {
        let c = cleaner();
        let cleaned = c.clean("abc123お前XYZ");
        assert_eq!(cleaned, "お前");
        assert!(cleaned.chars().all(|ch| !ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn normalizes_fullwidth_and_collapses_whitespace() {
        let c = cleaner();
        assert_eq!(c.clean("そう\u{3000}だ"), "そう だ");
        assert_eq!(c.clean("そう   \t だ"), "そう だ");
        assert_eq!(c.clean("  前後  "), "前後");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let c = cleaner();
        let inputs = [
            "《ナレ》♪こんにちは\u{3000}world 42",
            "（ため息）お前…マジ かよ",
            "   ",
            "",
            "ください",
            "abc《nested（x）》def",
            "お a b 前",
        ];
        for input in inputs {
            let once = c.clean(input);
            let twice = c.clean(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn can_produce_empty_output() {
        let c = cleaner();
        assert_eq!(c.clean("abc 123"), "");
        assert_eq!(c.clean("（全部注釈）"), "");
    }
}
