use regex::Regex;

use crate::error::Result;
use crate::types::PolitenessLabel;

/// How a rule's pattern is applied to the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The pattern may match anywhere in the text.
    Embedded,
    /// The pattern must match the entire trimmed text.
    WholeString,
}

/// One ordered labeling rule: a pattern, its scope, and the label it assigns.
pub struct LabelRule {
    pattern: Regex,
    scope: MatchScope,
    label: PolitenessLabel,
}

impl LabelRule {
    fn new(pattern: &str, scope: MatchScope, label: PolitenessLabel) -> Result<Self> {
        let pattern = match scope {
            MatchScope::Embedded => Regex::new(pattern)?,
            MatchScope::WholeString => Regex::new(&format!("^(?:{pattern})$"))?,
        };
        Ok(Self {
            pattern,
            scope,
            label,
        })
    }

    fn matches(&self, text: &str) -> bool {
        // WholeString rules are anchored at construction time, so both
        // scopes reduce to a plain match here.
        debug_assert!(
            self.scope != MatchScope::WholeString
                || self.pattern.as_str().starts_with('^')
        );
        self.pattern.is_match(text)
    }
}

/// Weak labeler assigning a coarse politeness register via ordered
/// pattern rules, first match wins.
///
/// The rule order is a deliberate precedence policy: honorific markers
/// are checked first because their presence is the strongest unambiguous
/// signal, casual markers next, plain/neutral forms last as a catch-all
/// before abstaining. Unmatched rows are left for a human reviewer
/// rather than guessed.
pub struct HeuristicLabeler {
    rules: Vec<LabelRule>,
}

impl HeuristicLabeler {
    /// Constructs the labeler with its fixed rule cascade.
    ///
    /// # Errors
    ///
    /// Returns `KeigoError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        let rules = vec![
            // Honorific/polite: copula です, polite ます endings,
            // imperative-polite requests, humble forms
            LabelRule::new(
                "ます|です|ください|ございます|いたします|よろしく|お願いいたします",
                MatchScope::Embedded,
                PolitenessLabel::Polite,
            )?,
            // Rough/casual: slang pronouns, casual sentence-final particles
            LabelRule::new(
                "お前|だよ|じゃん|かよ|ぜ|よな|なんだよ|そりゃ|やれよ|見て見て|だな",
                MatchScope::Embedded,
                PolitenessLabel::Casual,
            )?,
            // Short interjections, matched against the whole utterance
            LabelRule::new(
                r"あ+|え+|うん|ん\?|ふーん|はあ|あれ\?|えーっと.*",
                MatchScope::WholeString,
                PolitenessLabel::Neutral,
            )?,
            // Plain-form markers, embedded
            LabelRule::new(
                "のか|なんだ|〜てる|〜た|ってこと",
                MatchScope::Embedded,
                PolitenessLabel::Neutral,
            )?,
        ];

        Ok(Self { rules })
    }

    /// Labels one text block, or abstains with `None`.
    ///
    /// Empty or whitespace-only input always abstains.
    #[must_use]
    pub fn label(&self, text: &str) -> Option<PolitenessLabel> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(trimmed))
            .map(|rule| rule.label)
    }
}
