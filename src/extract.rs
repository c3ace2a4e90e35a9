//! Text extraction for uploaded documents.
//!
//! PDF bytes are parsed structurally with `pdf-extract`, page by page, so the
//! page count comes from the document itself. Everything else is treated as
//! UTF-8 text and passes through unchanged.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::error::ExtractionError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Mime types uploaders send when they do not know better.
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream", ""];

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Plain text plus the size facts recorded in document metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: u32,
    pub byte_size: u64,
}

/// Decide whether the bytes should be parsed as a PDF.
pub fn is_pdf(bytes: &[u8], mime_type: &str, filename: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    if mime == MIME_PDF || bytes.starts_with(PDF_MAGIC) {
        return true;
    }
    GENERIC_MIME_TYPES.contains(&mime.as_str()) && filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Extract plain text from raw document bytes.
///
/// Fails with [`ExtractionError`] when the bytes cannot be decoded or yield
/// no text at all; callers must not persist anything in that case.
pub fn extract_text(
    bytes: &[u8],
    mime_type: &str,
    filename: &str,
) -> Result<ExtractedText, ExtractionError> {
    let byte_size = bytes.len() as u64;
    let (text, page_count) = if is_pdf(bytes, mime_type, filename) {
        extract_pdf(bytes)?
    } else {
        let text = std::str::from_utf8(bytes).map_err(ExtractionError::Utf8)?;
        (text.to_string(), 1)
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty {
            filename: filename.to_string(),
        });
    }

    debug!(filename, page_count, byte_size, "extracted document text");
    Ok(ExtractedText {
        text,
        page_count,
        byte_size,
    })
}

fn extract_pdf(bytes: &[u8]) -> Result<(String, u32), ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|payload| ExtractionError::Malformed(panic_message(payload.as_ref())))?
    .map_err(ExtractionError::Pdf)?;

    let page_count = pages.len().max(1) as u32;
    let text = pages
        .iter()
        .map(|p| p.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok((text, page_count))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "PDF parser panicked".to_string()
    }
}
