use bytes::Bytes;
use tracing::{debug, warn};

/// Which extractor a document goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    PlainText,
    Other,
}

fn classify(filename: &str, mime: &str) -> DocumentKind {
    let filename = filename.to_ascii_lowercase();
    let mime = mime.to_ascii_lowercase();
    if filename.ends_with(".pdf") || mime == "application/pdf" {
        DocumentKind::Pdf
    } else if filename.ends_with(".txt") || mime.starts_with("text/plain") {
        DocumentKind::PlainText
    } else {
        DocumentKind::Other
    }
}

/// Best-effort text of an uploaded resume. Never fails: unreadable or
/// unsupported documents yield an empty string.
///
/// PDF parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_text(bytes: Bytes, filename: &str, mime: &str) -> String {
    match classify(filename, mime) {
        DocumentKind::Pdf => {
            let parsed = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
            })
            .await;
            match parsed {
                Ok(Ok(text)) => {
                    debug!("Extracted {} chars from {filename}", text.len());
                    text
                }
                Ok(Err(e)) => {
                    warn!("PDF extract failed for {filename}: {e}");
                    String::new()
                }
                Err(e) => {
                    warn!("PDF extract task aborted for {filename}: {e}");
                    String::new()
                }
            }
        }
        DocumentKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Other => {
            debug!("No text extractor for {filename} ({mime})");
            String::new()
        }
    }
}
