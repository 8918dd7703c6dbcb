//! Study-aid builders: keyword search, extractive summary, cloze quiz.

use serde::Serialize;

pub const MAX_SEARCH_RESULTS: usize = 10;
pub const SUMMARY_SENTENCES: usize = 5;
pub const QUIZ_SENTENCES: usize = 5;
/// Sentences with fewer words than this never become quiz questions.
pub const MIN_QUIZ_WORDS: usize = 7;

/// Placeholder substituted for the masked word in a quiz question.
pub const BLANK: &str = "____";

pub const NO_CONTENT_SUMMARY: &str = "No content found in PDF.";
pub const NO_TEXT_NOTE: &str = "No readable text found in PDF.";
pub const NO_QUIZ_NOTE: &str = "No quiz could be generated.";

/// Bloom-style label attached to a quiz item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tag {
    Remember,
    Apply,
    Analyze,
}

impl Tag {
    pub const ALL: [Tag; 3] = [Tag::Remember, Tag::Apply, Tag::Analyze];

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }
}

/// A fill-in-the-blank question built from one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "a")]
    pub answer: String,
    pub tag: Tag,
}

/// Sentences containing `query` (case-insensitive), in order, at most
/// [`MAX_SEARCH_RESULTS`].
pub fn search(sentences: &[String], query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    sentences
        .iter()
        .filter(|s| s.to_lowercase().contains(&needle))
        .take(MAX_SEARCH_RESULTS)
        .cloned()
        .collect()
}

/// The first [`SUMMARY_SENTENCES`] sentences joined by a space.
pub fn summarize(sentences: &[String]) -> String {
    if sentences.is_empty() {
        return NO_CONTENT_SUMMARY.to_string();
    }
    sentences
        .iter()
        .take(SUMMARY_SENTENCES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One quiz item per eligible sentence among the first [`QUIZ_SENTENCES`].
pub fn quiz(sentences: &[String], rng: &mut fastrand::Rng) -> Vec<QuizItem> {
    sentences
        .iter()
        .take(QUIZ_SENTENCES)
        .filter_map(|s| quiz_item(s, rng))
        .collect()
}

/// Mask one uniformly chosen word of `sentence`. Returns `None` for
/// sentences shorter than [`MIN_QUIZ_WORDS`].
pub fn quiz_item(sentence: &str, rng: &mut fastrand::Rng) -> Option<QuizItem> {
    let mut words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() < MIN_QUIZ_WORDS {
        return None;
    }

    let idx = rng.usize(..words.len());
    let answer = std::mem::replace(&mut words[idx], BLANK).to_string();

    Some(QuizItem {
        question: words.join(" "),
        answer,
        tag: Tag::random(rng),
    })
}
