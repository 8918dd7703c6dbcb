use mupdf::{Document, TextPageFlags};

use studyaid_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so the rest of the workspace does not transitively
/// depend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, BackendError> {
        let document = Document::from_bytes(data, "application/pdf")
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(line_text.trim_end());
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text.trim_end().to_string());
        }

        Ok(pages_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A one-page PDF without an xref table; MuPDF repairs it on open.
    const HELLO_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 6 0 R] /Count 2 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj
4 0 obj << /Length 43 >> stream
BT /F1 24 Tf 72 700 Td (Hello World.) Tj ET
endstream endobj
5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj
6 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

    #[test]
    fn test_garbage_yields_no_text() {
        // Depending on how far repair gets, MuPDF either errors or finds no pages.
        let result = MupdfBackend::new().extract_pages(b"%PDF-1.4 definitely not a pdf");
        assert!(result.map_or(true, |pages| pages.iter().all(|p| p.is_empty())));

        let text = studyaid_core::extract_document_text(b"%PDF-1.4 garbage", &MupdfBackend::new());
        assert_eq!(text, "");
    }

    #[test]
    fn test_extracts_text_per_page() {
        let pages = MupdfBackend::new().extract_pages(HELLO_PDF).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Hello World."));
        assert!(pages[1].is_empty());
    }

    #[test]
    fn test_document_text_skips_blank_page() {
        let text = studyaid_core::extract_document_text(HELLO_PDF, &MupdfBackend::new());
        assert_eq!(text, "Hello World.");
    }
}
