//! Text layer of a statement: PDF pages (via `pdf_extract`) or plain text
//! turned into `RawLine`s.

use anyhow::{anyhow, Context, Result};
use extrato_core::RawLine;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

/// Page separator used by `pdftotext` and friends.
const FORM_FEED: char = '\u{000C}';

/// Read a `.pdf` (text layer) or a `.txt` dump into lines.
pub fn read_statement_lines(path: &Path) -> Result<Vec<RawLine>> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        lines_from_pdf_bytes(&data).with_context(|| format!("extract text from {}", path.display()))
    } else {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(lines_from_text(&text))
    }
}

/// Extract the text layer page by page. `pdf_extract` panics on some
/// malformed files; those panics come back as errors.
pub fn lines_from_pdf_bytes(data: &[u8]) -> Result<Vec<RawLine>> {
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }))
    .map_err(|_| anyhow!("PDF text extraction panicked (malformed document)"))?
    .map_err(|e| anyhow!("PDF text extraction failed: {e}"))?;

    debug!(pages = pages.len(), "extracted PDF text layer");
    Ok(lines_from_pages(&pages))
}

/// Plain text, pages separated by form feeds.
pub fn lines_from_text(text: &str) -> Vec<RawLine> {
    let pages: Vec<&str> = text.split(FORM_FEED).collect();
    lines_from_pages(&pages)
}

pub fn lines_from_pages<S: AsRef<str>>(pages: &[S]) -> Vec<RawLine> {
    pages
        .iter()
        .enumerate()
        .flat_map(|(page, text)| {
            text.as_ref()
                .lines()
                .enumerate()
                .map(move |(line, t)| RawLine::new(page, line, t.trim_end()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_from_text_splits_pages() {
        let lines = lines_from_text("a\nb  \n\u{000C}c\n");
        assert_eq!(
            lines,
            vec![
                RawLine::new(0, 0, "a"),
                RawLine::new(0, 1, "b"),
                RawLine::new(1, 0, "c"),
            ]
        );
    }

    #[test]
    fn test_garbage_pdf_is_an_error() {
        assert!(lines_from_pdf_bytes(b"not a pdf").is_err());
    }
}
