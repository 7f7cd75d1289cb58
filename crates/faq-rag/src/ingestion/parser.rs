//! PDF/TXT text extraction

use async_trait::async_trait;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::{DocumentStoreProvider, TextExtractor};
use crate::types::{Document, FileType};

/// pdf-extract can spin on malformed font tables; give up after this long
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Typographic characters PDF fonts commonly emit, mapped to plain text
const TYPOGRAPHIC_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{0000}', ""),
    ('\u{00A0}', " "),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
];

/// PDF/TXT file parser
pub struct FileParser;

impl FileParser {
    /// Extract text from file bytes, dispatching on the file name's extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<String> {
        match FileType::from_path(filename) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt => Ok(Self::parse_text(data)),
            FileType::Unknown => Err(Error::UnsupportedFileType(format!(
                "{} - only PDF and TXT files are supported",
                filename
            ))),
        }
    }

    /// Parse plain text (invalid UTF-8 sequences are replaced)
    fn parse_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).into_owned()
    }

    /// Parse a PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let raw = Self::extract_pdf_with_timeout(filename, data)?;
        let content = cleanup_pdf_text(&raw);

        if content.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        Ok(content)
    }

    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(message)) => {
                let _ = handle.join();
                Err(Error::extraction(filename, message))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!(
                    "PDF extraction of '{}' timed out after {}s",
                    filename,
                    PDF_EXTRACT_TIMEOUT.as_secs()
                );
                Err(Error::extraction(filename, "PDF extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::extraction(filename, "PDF extraction thread crashed"))
            }
        }
    }
}

/// Normalise typography and drop blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (from, to) in TYPOGRAPHIC_REPLACEMENTS {
        if result.contains(*from) {
            result = result.replace(*from, to);
        }
    }

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts text from files held by a document store
pub struct StoredFileExtractor {
    store: Arc<dyn DocumentStoreProvider>,
}

impl StoredFileExtractor {
    pub fn new(store: Arc<dyn DocumentStoreProvider>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TextExtractor for StoredFileExtractor {
    async fn extract_text(&self, document: &Document) -> Result<String> {
        if !document.file_type.is_supported() {
            return Err(Error::UnsupportedFileType(format!(
                "{} - only PDF and TXT files are supported",
                document.source
            )));
        }

        let data = self
            .store
            .get_document(&document.source)
            .await
            .map_err(|e| Error::extraction(&document.source, e.to_string()))?;

        let filename = document.filename().to_string();
        tokio::task::spawn_blocking(move || FileParser::parse(&filename, &data))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::MemoryDocumentStore;

    #[test]
    fn test_parse_text_lossy() {
        let text = FileParser::parse("info.txt", "Giờ mở cửa: 10:00".as_bytes()).unwrap();
        assert_eq!(text, "Giờ mở cửa: 10:00");

        let lossy = FileParser::parse("bad.txt", &[0x48, 0x69, 0xFF]).unwrap();
        assert!(lossy.starts_with("Hi"));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(matches!(
            FileParser::parse("slides.pptx", b"data"),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_parse_invalid_pdf() {
        assert!(matches!(
            FileParser::parse("broken.pdf", b"not a pdf"),
            Err(Error::Extraction { .. })
        ));
    }

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("  \u{201C}Ngư Quán\u{201D}\u{00A0}\n\n\u{2022}cá lăng \u{2013} cá chình\0 ");
        assert_eq!(cleaned, "\"Ngư Quán\"\n* cá lăng - cá chình");
    }

    #[tokio::test]
    async fn test_extract_from_store() {
        let store = Arc::new(MemoryDocumentStore::new());
        let path = store
            .store_document("menu.txt", "Cá lăng nướng".as_bytes())
            .await
            .unwrap();

        let extractor = StoredFileExtractor::new(store);
        let text = extractor.extract_text(&Document::new(path)).await.unwrap();
        assert_eq!(text, "Cá lăng nướng");
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let extractor = StoredFileExtractor::new(Arc::new(MemoryDocumentStore::new()));
        let err = extractor
            .extract_text(&Document::new("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }
}
