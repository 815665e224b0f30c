use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

pub trait PdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

/// Extracts the full document text with lopdf, flattening pages into one
/// newline-joined string. Per-page offsets are not preserved downstream.
#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        if pages.is_empty() {
            return Err(IngestError::EmptyDocument(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages.join("\n"))
    }
}

pub fn extract_document_text(path: &Path) -> Result<String, IngestError> {
    LopdfExtractor.extract_text(path)
}
