use crate::backend::PdfBackend;
use crate::extract::extract_document_text;
use crate::sentences::{SentenceTokenizer, split_sentences};
use crate::study::{self, QuizItem};

/// An uploaded document after text extraction and sentence splitting.
///
/// Built once per request and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub text: String,
    pub sentences: Vec<String>,
}

/// Outcome of a keyword search over a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Matches(Vec<String>),
    /// The PDF had no extractable text; matching was not attempted.
    NoText,
}

impl Document {
    /// Run the extraction and splitting chain over raw PDF bytes.
    pub fn from_pdf(
        data: &[u8],
        backend: &dyn PdfBackend,
        tokenizer: &dyn SentenceTokenizer,
    ) -> Self {
        let text = extract_document_text(data, backend);
        Self::from_text(text, tokenizer)
    }

    pub fn from_text(text: String, tokenizer: &dyn SentenceTokenizer) -> Self {
        let sentences = split_sentences(&text, tokenizer);
        Self { text, sentences }
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn search(&self, query: &str) -> SearchOutcome {
        if !self.has_text() {
            return SearchOutcome::NoText;
        }
        SearchOutcome::Matches(study::search(&self.sentences, query))
    }

    pub fn summary(&self) -> String {
        study::summarize(&self.sentences)
    }

    pub fn quiz(&self, rng: &mut fastrand::Rng) -> Vec<QuizItem> {
        study::quiz(&self.sentences, rng)
    }
}
