use crate::backend::PdfBackend;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// PDF readers accept a header anywhere in the first 1 KiB.
const HEADER_SEARCH_BYTES: usize = 1024;

/// Returns `true` if the PDF header magic appears within the first
/// [`HEADER_SEARCH_BYTES`] of `data`.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(HEADER_SEARCH_BYTES)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Extract the full document text from raw PDF bytes.
///
/// Never fails: unreadable input is logged and yields an empty string.
/// Pages without text are dropped entirely, the rest are joined with `\n`.
pub fn extract_document_text(data: &[u8], backend: &dyn PdfBackend) -> String {
    if !looks_like_pdf(data) {
        tracing::warn!(bytes = data.len(), "upload is not a PDF, treating as empty");
        return String::new();
    }

    let pages = match backend.extract_pages(data) {
        Ok(pages) => pages,
        Err(e) => {
            tracing::warn!(error = %e, "PDF read error");
            return String::new();
        }
    };

    let page_count = pages.len();
    let text = join_pages(pages);
    tracing::debug!(pages = page_count, chars = text.len(), "extracted document text");
    text
}

/// Join per-page text, skipping pages that contribute nothing.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.trim().is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text.trim().to_string()
}
