//! Raw material for a practice script, and validation of what comes back.

use std::collections::HashSet;
use std::path::Path;

use crate::model::ProcessedContent;

use super::ServiceError;

/// Source material handed to the [`ContentIngestor`](super::ContentIngestor).
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// Pasted or plain-text file content.
    Text(String),
    /// A document the model reads directly (PDF, image).
    File { bytes: Vec<u8>, mime_type: String },
}

impl ContentSource {
    /// Load a file, choosing inline upload for PDFs and images and plain text
    /// for everything else.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        match inline_mime_type(path) {
            Some(mime_type) => Ok(ContentSource::File {
                bytes,
                mime_type: mime_type.to_string(),
            }),
            None => Ok(ContentSource::Text(
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ContentSource::Text(text) => text.trim().is_empty(),
            ContentSource::File { bytes, .. } => bytes.is_empty(),
        }
    }
}

/// MIME type for files the model should read as documents.
fn inline_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Check an ingestion result before a session is built from it.
///
/// Blank sentences are dropped, text is trimmed, an empty title gets a
/// placeholder, and colliding ids are renumbered past the largest id seen.
pub fn normalize(mut content: ProcessedContent) -> Result<ProcessedContent, ServiceError> {
    content.sentences.retain(|s| !s.text.trim().is_empty());
    if content.sentences.is_empty() {
        return Err(ServiceError::EmptyResponse);
    }

    let title = content.title.trim();
    content.title = if title.is_empty() {
        "Untitled session".to_string()
    } else {
        title.to_string()
    };

    let mut next_id = content.sentences.iter().map(|s| s.id).max().unwrap_or(0);
    let mut seen = HashSet::new();
    for sentence in &mut content.sentences {
        sentence.text = sentence.text.trim().to_string();
        sentence.translation = sentence.translation.trim().to_string();
        if !seen.insert(sentence.id) {
            next_id += 1;
            log::debug!(
                "services: duplicate sentence id {} renumbered to {next_id}",
                sentence.id
            );
            sentence.id = next_id;
            seen.insert(next_id);
        }
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Sentence};
    use std::io::Write;

    fn sentence(id: i64, text: &str) -> Sentence {
        Sentence {
            id,
            text: text.into(),
            translation: String::new(),
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn text_file_is_read_as_text() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "# Notes\nThe quick brown fox.").unwrap();

        let source = ContentSource::from_path(file.path()).unwrap();
        assert_eq!(
            source,
            ContentSource::Text("# Notes\nThe quick brown fox.".into())
        );
    }

    #[test]
    fn pdf_is_sent_inline() {
        let mut file = tempfile::Builder::new().suffix(".PDF").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        match ContentSource::from_path(file.path()).unwrap() {
            ContentSource::File { bytes, mime_type } => {
                assert_eq!(mime_type, "application/pdf");
                assert_eq!(bytes, b"%PDF-1.4");
            }
            other => panic!("expected inline file, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentSource::from_path(&dir.path().join("nope.txt")).is_err());
    }

    #[test]
    fn blank_source_is_empty() {
        assert!(ContentSource::Text("  \n".into()).is_empty());
        assert!(!ContentSource::Text("Hi.".into()).is_empty());
    }

    #[test]
    fn normalize_rejects_empty_script() {
        let content = ProcessedContent {
            title: "T".into(),
            sentences: vec![sentence(1, "   ")],
        };
        assert_eq!(normalize(content), Err(ServiceError::EmptyResponse));
    }

    #[test]
    fn normalize_renumbers_duplicate_ids() {
        let content = ProcessedContent {
            title: "  ".into(),
            sentences: vec![sentence(1, "A"), sentence(1, " B "), sentence(2, "C")],
        };
        let out = normalize(content).unwrap();
        let ids: Vec<i64> = out.sentences.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(out.sentences[1].text, "B");
        assert_eq!(out.title, "Untitled session");
    }
}
