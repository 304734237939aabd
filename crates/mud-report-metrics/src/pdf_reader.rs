use encoding_rs::UTF_16BE;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::ReportError;
use crate::model::PageText;

/// pdf-extract ends every page with a form feed.
fn split_form_feed_pages(text: &str) -> Vec<&str> {
    text.strip_suffix('\u{000C}')
        .unwrap_or(text)
        .split('\u{000C}')
        .collect()
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let utf16_hint = bytes.starts_with(&[0xFE, 0xFF])
        || encoding.is_some_and(|name| {
            let lower = name.to_ascii_lowercase();
            lower.contains("utf16") || lower.contains("ucs2") || lower.contains("identity-h")
        });
    if utf16_hint {
        let body = bytes.strip_prefix(&[0xFE, 0xFF]).unwrap_or(bytes);
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(body);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Scores how much a candidate looks like `label value` report text.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut field_lines = 0_i64;
    let mut labelled_lines = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;

        let has_digit = line.chars().any(|ch| ch.is_ascii_digit());
        let has_alpha = line.chars().any(char::is_alphabetic);
        if has_digit && has_alpha {
            field_lines += 1;
        }
        if line.contains(':') || line.contains('=') {
            labelled_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    field_lines * 20 + labelled_lines * 5 + non_empty_lines - broken_penalty
}

/// Accumulates shown strings, starting a new line at each text move.
#[derive(Debug, Default)]
struct LineCollector {
    lines: Vec<String>,
    current: String,
}

impl LineCollector {
    fn show(&mut self, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    self.current.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => self.show(encoding, items),
                // Wide negative kerning inside TJ separates words.
                Object::Integer(offset) if *offset < -100 => self.current.push(' '),
                Object::Real(offset) if *offset < -100.0 => self.current.push(' '),
                _ => {}
            }
        }
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        if !line.trim().is_empty() {
            self.lines.push(line);
        }
    }

    fn finish(mut self) -> Option<String> {
        self.break_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = document
        .get_page_content(page_id)
        .ok()
        .and_then(|raw| Content::decode(&raw).ok())?;
    let fonts = document.get_page_fonts(page_id);

    let mut encoding = None;
    let mut lines = LineCollector::default();
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|name| fonts.get(name))
                    .map(|font| font.get_font_encoding());
            }
            "Tj" | "TJ" => lines.show(encoding, &operation.operands),
            "'" | "\"" => {
                lines.break_line();
                lines.show(encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => lines.break_line(),
            _ => {}
        }
    }
    lines.finish()
}

/// Runs pdf-extract, which can panic on malformed font tables.
#[cfg(not(target_arch = "wasm32"))]
fn pdf_extract_text(input_pdf: &[u8]) -> Option<String> {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(input_pdf)))
        .ok()?
        .ok()
}

/// Panics abort on wasm32, so one bad upload would end the whole request.
/// The worker relies on lopdf alone.
#[cfg(target_arch = "wasm32")]
fn pdf_extract_text(_input_pdf: &[u8]) -> Option<String> {
    None
}

pub(crate) fn read_pdf_pages_from_bytes(input_pdf: &[u8]) -> Result<Vec<PageText>, ReportError> {
    let document = Document::load_mem(input_pdf)?;
    let pages_map = document.get_pages();
    if pages_map.is_empty() {
        return Err(ReportError::NoPages);
    }

    let extracted = pdf_extract_text(input_pdf);
    let (split_pages, whole_text) = match extracted.as_deref() {
        Some(text) => {
            let pages = split_form_feed_pages(text);
            if pages.len() == pages_map.len() {
                (pages, None)
            } else {
                (Vec::new(), Some(text))
            }
        }
        None => (Vec::new(), None),
    };

    let mut pages = Vec::with_capacity(pages_map.len());
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        let mut candidates = Vec::new();
        candidates.extend(split_pages.get(index).map(|text| (*text).to_string()));
        candidates.extend(content_stream_text(&document, *page_id));
        candidates.extend(document.extract_text(&[*page_no]).ok());
        candidates.retain(|text| !text.trim().is_empty());

        // A whole-document fallback stands in for the first page only.
        if index == 0
            && candidates.is_empty()
            && let Some(text) = whole_text.filter(|text| !text.trim().is_empty())
        {
            candidates.push(text.to_string());
        }

        let text = candidates
            .into_iter()
            .max_by_key(|text| extraction_quality_score(text))
            .unwrap_or_default();
        pages.push(PageText {
            page_number: *page_no,
            text,
        });
    }

    Ok(pages)
}

/// Concatenates page text in document order.
pub(crate) fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| page.text.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads a PDF and returns the report text of all pages.
///
/// # Errors
///
/// Returns [`ReportError::PdfLoad`] when the bytes are not a readable PDF and
/// [`ReportError::NoPages`] when it has no pages.
pub fn read_report_text(input_pdf: &[u8]) -> Result<String, ReportError> {
    let pages = read_pdf_pages_from_bytes(input_pdf)?;
    let text = join_pages(&pages);
    // Keep a trailing break so `value\s` style patterns match on the last line.
    Ok(format!("{text}\n"))
}
