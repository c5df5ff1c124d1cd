//! Plain-text extraction from uploaded documents.

use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Unsupported,
}

/// Classifies a document by content type, falling back to the file extension.
pub fn classify(content_type: &str, file_name: &str) -> DocumentKind {
    let content_type = content_type.to_ascii_lowercase();
    if content_type == "application/pdf" {
        return DocumentKind::Pdf;
    }
    if content_type.starts_with("text/") {
        return DocumentKind::PlainText;
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => DocumentKind::Pdf,
        "txt" | "md" | "csv" => DocumentKind::PlainText,
        _ => DocumentKind::Unsupported,
    }
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Extracts text, or `None` for formats we do not read.
/// PDF parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_text(
    bytes: Bytes,
    content_type: &str,
    file_name: &str,
) -> Result<Option<String>, AppError> {
    let text = match classify(content_type, file_name) {
        DocumentKind::Pdf => {
            let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?;
            match result {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not extract text from PDF '{file_name}': {e}");
                    return Ok(None);
                }
            }
        }
        DocumentKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Unsupported => return Ok(None),
    };

    let cleaned = clean_text(&text);
    Ok((!cleaned.is_empty()).then_some(cleaned))
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_content_type_then_extension() {
        assert_eq!(classify("application/pdf", "cv.bin"), DocumentKind::Pdf);
        assert_eq!(classify("text/plain; charset=utf-8", "cv"), DocumentKind::PlainText);
        assert_eq!(classify("application/octet-stream", "CV.PDF"), DocumentKind::Pdf);
        assert_eq!(classify("application/octet-stream", "notes.txt"), DocumentKind::PlainText);
        assert_eq!(
            classify("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "cv.docx"),
            DocumentKind::Unsupported
        );
    }

    #[test]
    fn test_clean_text_collapses_blank_lines() {
        let raw = "  Jean Martin  \n\n\n\nConsultant   \n \n";
        assert_eq!(clean_text(raw), "Jean Martin\n\nConsultant");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("éèàç", 2), "éè");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_extract_plain_text() {
        let bytes = Bytes::from_static("Compétences : Java\n\n\nSQL".as_bytes());
        let text = extract_text(bytes, "text/plain", "cv.txt").await.unwrap();
        assert_eq!(text.as_deref(), Some("Compétences : Java\n\nSQL"));
    }

    #[tokio::test]
    async fn test_extract_unsupported_and_empty() {
        let docx = extract_text(Bytes::from_static(b"PK\x03\x04"), "application/zip", "cv.docx")
            .await
            .unwrap();
        assert_eq!(docx, None);
        let empty = extract_text(Bytes::from_static(b"  \n "), "text/plain", "cv.txt")
            .await
            .unwrap();
        assert_eq!(empty, None);
    }
}
