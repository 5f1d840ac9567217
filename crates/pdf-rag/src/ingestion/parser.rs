//! PDF text extraction, one entry per page

use crate::error::{Error, Result};

/// Text extracted from a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// Pages of a parsed PDF, in page order. Pages without text are omitted.
#[derive(Debug, Clone, Default)]
pub struct ParsedPdf {
    pub pages: Vec<PageText>,
    /// Page count reported by the document, including blank pages
    pub total_pages: u32,
}

/// PDF parser
pub struct PdfParser;

impl PdfParser {
    /// Extract page texts from `data`.
    ///
    /// Uses per-page extraction through `lopdf` and falls back to whole-document
    /// extraction through `pdf-extract` (reported as page 1) when that yields
    /// nothing. A document with no text at all is a parse error.
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        let (mut pages, total_pages) = match lopdf::Document::load_mem(data) {
            Ok(doc) => Self::extract_pages(&doc),
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}", filename, e);
                (Vec::new(), 0)
            }
        };

        if pages.is_empty() {
            tracing::debug!("Per-page extraction empty for {}, trying pdf-extract", filename);
            let text = pdf_extract::extract_text_from_mem(data)
                .map_err(|e| Error::file_parse(filename, format!("Failed to extract text: {}", e)))?;
            let text = clean_text(&text);
            if !text.is_empty() {
                pages.push(PageText { number: 1, text });
            }
        }

        if pages.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        tracing::info!("Extracted {} pages with text from {}", pages.len(), filename);

        Ok(ParsedPdf {
            total_pages: total_pages.max(pages.len() as u32),
            pages,
        })
    }

    fn extract_pages(doc: &lopdf::Document) -> (Vec<PageText>, u32) {
        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let total = numbers.len() as u32;

        let pages = numbers
            .into_iter()
            .filter_map(|number| match doc.extract_text(&[number]) {
                Ok(text) => {
                    let text = clean_text(&text);
                    (!text.is_empty()).then_some(PageText { number, text })
                }
                Err(e) => {
                    tracing::debug!("Could not extract page {}: {}", number, e);
                    None
                }
            })
            .collect();

        (pages, total)
    }
}

/// Normalize extracted text: strip NULs, expand common ligatures, trim each
/// line and drop blank runs longer than one paragraph break.
pub(crate) fn clean_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}
