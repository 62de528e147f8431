pub mod extractor;
pub mod store;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extractor::{Extraction, FileTextExtractor, SkipReason, TextExtractor};
pub use store::FsCorpusStore;


pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "pdf", "docx"];


#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Invalid document name: {0}")]
    InvalidName(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Document too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Upload { filename: String, bytes: Vec<u8> },
    Inline(String),
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub id: String,
    pub source: DocumentSource,
}

impl DocumentHandle {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id,
            source: DocumentSource::File(path),
        }
    }

    pub fn upload(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            id: filename.clone(),
            source: DocumentSource::Upload { filename, bytes },
        }
    }

    pub fn inline(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: DocumentSource::Inline(text.into()),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub filename: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}


/// Lower-cased extension of `name` if it is one the extractor can read.
pub fn supported_extension(name: &str) -> Option<String> {
    let ext = std::path::Path::new(name)
        .extension()?
        .to_string_lossy()
        .to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}


/// Flat store of reference documents keyed by filename.
///
/// `list_documents` is the snapshot an analysis iterates over; it is ordered
/// so ranking ties are deterministic.
pub trait CorpusStore: Send + Sync {
    fn list_documents(&self) -> Result<Vec<DocumentHandle>, CorpusError>;

    fn get(&self, filename: &str) -> Result<Option<DocumentHandle>, CorpusError>;

    fn add(&self, filename: &str, bytes: &[u8]) -> Result<CorpusEntry, CorpusError>;

    fn remove(&self, filename: &str) -> Result<bool, CorpusError>;

    fn entries(&self) -> Result<Vec<CorpusEntry>, CorpusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extension() {
        assert_eq!(supported_extension("essay.TXT").as_deref(), Some("txt"));
        assert_eq!(supported_extension("paper.pdf").as_deref(), Some("pdf"));
        assert_eq!(supported_extension("draft.Docx").as_deref(), Some("docx"));
        assert_eq!(supported_extension("notes.md"), None);
        assert_eq!(supported_extension("README"), None);
    }

    #[test]
    fn test_file_handle_uses_filename_as_id() {
        let handle = DocumentHandle::file("/srv/corpus/thesis.pdf");
        assert_eq!(handle.id, "thesis.pdf");
        assert!(matches!(handle.source, DocumentSource::File(_)));
    }
}
