use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::{supported_extension, DocumentHandle, DocumentSource};

lazy_static! {
    static ref DOCX_TEXT_RUN: Regex = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap();
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    UnsupportedFormat(String),
    Unreadable(String),
}


/// Outcome of reading one document. Never an error: anything that prevents
/// reading becomes a skip the caller can reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Skipped(SkipReason),
}

impl Extraction {
    /// Trimmed text; blank text counts as [`SkipReason::Empty`].
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            Self::Skipped(SkipReason::Empty)
        } else {
            Self::Text(trimmed.to_string())
        }
    }


    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Skipped(_) => None,
        }
    }
}


pub trait TextExtractor: Send + Sync {
    fn extract(&self, handle: &DocumentHandle) -> Extraction;
}


/// Reads `.txt`, `.pdf` and `.docx` from disk or from uploaded bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_bytes(name: &str, bytes: &[u8]) -> Extraction {
        let Some(ext) = supported_extension(name) else {
            return Extraction::Skipped(SkipReason::UnsupportedFormat(name.to_string()));
        };

        let text = match ext.as_str() {
            "txt" => Ok(String::from_utf8_lossy(bytes).into_owned()),
            "pdf" => pdf_text(bytes),
            "docx" => docx_text(bytes),
            _ => return Extraction::Skipped(SkipReason::UnsupportedFormat(name.to_string())),
        };

        match text {
            Ok(text) => Extraction::from_text(text),
            Err(e) => {
                warn!("Could not read '{}': {}", name, e);
                Extraction::Skipped(SkipReason::Unreadable(e))
            }
        }
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract(&self, handle: &DocumentHandle) -> Extraction {
        let extraction = match &handle.source {
            DocumentSource::Inline(text) => Extraction::from_text(text),
            DocumentSource::Upload { filename, bytes } => Self::extract_bytes(filename, bytes),
            DocumentSource::File(path) => match std::fs::read(path) {
                Ok(bytes) => Self::extract_bytes(&handle.id, &bytes),
                Err(e) => {
                    warn!("Could not open '{}': {}", path.display(), e);
                    Extraction::Skipped(SkipReason::Unreadable(e.to_string()))
                }
            },
        };

        if let Extraction::Text(ref text) = extraction {
            debug!("Extracted {} chars from '{}'", text.chars().count(), handle.id);
        }
        extraction
    }
}


fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    // The PDF parser can panic on malformed input.
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("pdf parser panicked".to_string()),
    }
}


fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let paragraphs: Vec<String> = xml
        .split("</w:p>")
        .map(|paragraph| {
            DOCX_TEXT_RUN
                .captures_iter(paragraph)
                .filter_map(|c| c.get(1))
                .map(|m| decode_xml_entities(m.as_str()))
                .collect::<String>()
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_inline_text_is_trimmed() {
        let handle = DocumentHandle::inline("submitted", "  hello world \n");
        assert_eq!(FileTextExtractor.extract(&handle), Extraction::Text("hello world".into()));
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let handle = DocumentHandle::upload("blank.txt", b"   \n\t".to_vec());
        assert_eq!(FileTextExtractor.extract(&handle), Extraction::Skipped(SkipReason::Empty));
    }

    #[test]
    fn test_unsupported_upload_is_skipped() {
        let handle = DocumentHandle::upload("photo.png", vec![1, 2, 3]);
        assert!(matches!(
            FileTextExtractor.extract(&handle),
            Extraction::Skipped(SkipReason::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let handle = DocumentHandle::file("/definitely/not/here.txt");
        assert!(matches!(
            FileTextExtractor.extract(&handle),
            Extraction::Skipped(SkipReason::Unreadable(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let handle = DocumentHandle::upload("legacy.txt", vec![b'o', b'k', 0xFF, b'!']);
        let text = FileTextExtractor.extract(&handle).into_text().unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Fish &amp; chips</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> are</w:t></w:r></w:p><w:p><w:r><w:t>tasty</w:t></w:r></w:p></w:body></w:document>"#;
        let handle = DocumentHandle::upload("menu.docx", docx_bytes(xml));
        assert_eq!(
            FileTextExtractor.extract(&handle),
            Extraction::Text("Fish & chips are\ntasty".into())
        );
    }

    #[test]
    fn test_corrupt_docx_is_unreadable() {
        let handle = DocumentHandle::upload("broken.docx", b"not a zip".to_vec());
        assert!(matches!(
            FileTextExtractor.extract(&handle),
            Extraction::Skipped(SkipReason::Unreadable(_))
        ));
    }
}
