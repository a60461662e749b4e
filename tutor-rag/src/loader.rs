//! Loading raw text from knowledge-base files.
//!
//! Dispatch is by extension (case-insensitive): `pdf` goes through text
//! extraction, `txt` and `md` are read as UTF-8. Anything else is rejected
//! before the file is opened.

use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// Supported knowledge-base file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Markdown,
}

impl DocumentFormat {
    /// Determine the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension =
            path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            "md" => Ok(Self::Markdown),
            _ => Err(RagError::UnsupportedFormat { path: path.to_path_buf(), extension }),
        }
    }
}

/// Whether a path has one of the supported extensions.
pub fn is_supported(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_ok()
}

/// Load the text of a PDF, TXT or MD file.
pub async fn load_document(path: &Path) -> Result<String> {
    let format = DocumentFormat::from_path(path)?;
    let text = match format {
        DocumentFormat::Text | DocumentFormat::Markdown => tokio::fs::read_to_string(path).await?,
        DocumentFormat::Pdf => {
            let bytes = tokio::fs::read(path).await?;
            let owned = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| RagError::DocumentLoad { path: owned.clone(), message: e.to_string() })?
                .map_err(|e| RagError::DocumentLoad { path: owned, message: e.to_string() })?
        }
    };
    debug!(path = %path.display(), ?format, text_len = text.len(), "loaded document");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_extension_case_insensitively() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.PDF")).unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path(Path::new("notes.txt")).unwrap(), DocumentFormat::Text);
        assert_eq!(DocumentFormat::from_path(Path::new("ev.md")).unwrap(), DocumentFormat::Markdown);
    }

    #[test]
    fn rejects_other_extensions() {
        let err = DocumentFormat::from_path(Path::new("slides.docx")).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { ref extension, .. } if extension == "docx"));
        assert!(!is_supported(Path::new("README")));
    }

    #[tokio::test]
    async fn unsupported_file_is_rejected_without_reading() {
        let err = load_document(Path::new("/definitely/missing/file.docx")).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn reads_markdown_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev.md");
        std::fs::write(&path, "# Expected value\n\nAverage outcome.").unwrap();

        let text = load_document(&path).await.unwrap();
        assert_eq!(text, "# Expected value\n\nAverage outcome.");
    }

    #[tokio::test]
    async fn corrupt_pdf_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = load_document(&path).await.unwrap_err();
        assert!(matches!(err, RagError::DocumentLoad { .. }));
    }
}
