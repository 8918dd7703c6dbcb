//! Sentence splitting.
//!
//! The primary strategy is a rule-based boundary detector ([`RuleTokenizer`]).
//! When it reports an error, [`split_sentences`] falls back to one sentence
//! per non-blank line.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::assets::{self, TokenizerAssets};

/// Inputs larger than this are handed to the newline fallback.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 8 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("input of {len} bytes exceeds the {max} byte limit")]
    InputTooLarge { len: usize, max: usize },
    #[error("{0}")]
    Other(String),
}

/// A sentence-boundary detector.
pub trait SentenceTokenizer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Split `text` into sentences in reading order.
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError>;
}

/// Split document text into sentences, falling back to line splitting if the
/// tokenizer fails. Empty text yields an empty sequence without touching
/// either strategy.
pub fn split_sentences(text: &str, tokenizer: &dyn SentenceTokenizer) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    match tokenizer.tokenize(text) {
        Ok(sentences) => sentences
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Err(e) => {
            tracing::warn!(
                tokenizer = tokenizer.name(),
                error = %e,
                "sentence tokenizer failed, splitting on newlines"
            );
            split_lines(text)
        }
    }
}

/// One sentence per non-blank line, trimmed.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rule-based sentence splitter.
///
/// A boundary follows a run of `.`, `!`, `?` or `…` (plus closing quotes or
/// brackets) when the next character is whitespace or the end of text. A
/// period is not a boundary after a known abbreviation, after a single-letter
/// initial, or when the following word starts lowercase.
#[derive(Debug, Clone)]
pub struct RuleTokenizer {
    abbreviations: Arc<HashSet<String>>,
    max_input_bytes: usize,
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self::new(assets::builtin_abbreviations())
    }
}

impl RuleTokenizer {
    pub fn new(abbreviations: HashSet<String>) -> Self {
        Self {
            abbreviations: Arc::new(abbreviations),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    pub fn from_assets(assets: &TokenizerAssets) -> Self {
        Self::new(assets.abbreviations.clone())
    }

    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    fn is_abbreviation(&self, token: &str) -> bool {
        let token = token.trim_start_matches(is_opener);
        if token.is_empty() {
            return false;
        }
        // Single-letter initials ("J. R. R. Tolkien"). The pronoun "I" ends
        // sentences far more often than it abbreviates a name.
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_alphabetic() && c != 'I' {
                return true;
            }
        }
        self.abbreviations.contains(&token.to_lowercase())
    }
}

impl SentenceTokenizer for RuleTokenizer {
    fn name(&self) -> &str {
        "rule"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        if text.len() > self.max_input_bytes {
            return Err(TokenizeError::InputTooLarge {
                len: text.len(),
                max: self.max_input_bytes,
            });
        }

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            if !is_terminator(chars[i].1) {
                i += 1;
                continue;
            }

            let run_start = i;
            let mut j = i + 1;
            while j < chars.len() && is_terminator(chars[j].1) {
                j += 1;
            }
            while j < chars.len() && is_closer(chars[j].1) {
                j += 1;
            }

            // Terminators glued to the next word ("3.14", "e.g") never split.
            if j < chars.len() && !chars[j].1.is_whitespace() {
                i = j;
                continue;
            }

            let end = chars.get(j).map_or(text.len(), |&(pos, _)| pos);

            if chars[run_start].1 == '.' && j < chars.len() {
                let run_byte = chars[run_start].0;
                let token = text[start..run_byte]
                    .rsplit(char::is_whitespace)
                    .next()
                    .unwrap_or("");

                let next_word = text[end..].trim_start();
                let next_is_lower = next_word
                    .chars()
                    .find(|c| !is_opener(*c))
                    .is_some_and(char::is_lowercase);

                if self.is_abbreviation(token) || next_is_lower {
                    i = j;
                    continue;
                }
            }

            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
            i = j;
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }

        Ok(sentences)
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}' | '\u{201D}' | '\u{2019}' | '»')
}

fn is_opener(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '{' | '\u{201C}' | '\u{2018}' | '«')
}
