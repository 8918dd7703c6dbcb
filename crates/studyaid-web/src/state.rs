use std::sync::Arc;

use studyaid_core::{PdfBackend, SentenceTokenizer, Settings, VoiceSynthesizer};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pdf_backend: Arc<dyn PdfBackend>,
    pub tokenizer: Arc<dyn SentenceTokenizer>,
    pub voice: VoiceSynthesizer,
    pub default_lang: String,
    pub serve_audio: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        pdf_backend: Arc<dyn PdfBackend>,
        tokenizer: Arc<dyn SentenceTokenizer>,
        voice: VoiceSynthesizer,
        settings: &Settings,
    ) -> Self {
        Self {
            pdf_backend,
            tokenizer,
            voice,
            default_lang: settings.default_lang.clone(),
            serve_audio: settings.serve_audio,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}
