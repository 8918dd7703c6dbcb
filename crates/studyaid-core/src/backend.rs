use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors only turn raw bytes into per-page text; joining pages into
/// document text and recovering from failures lives in
/// [`crate::extract::extract_document_text`].
pub trait PdfBackend: Send + Sync {
    /// Extract the plain text of every page, in document order.
    ///
    /// Pages without text may be returned as empty strings.
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, BackendError>;
}
