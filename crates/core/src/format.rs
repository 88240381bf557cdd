//! Supported input formats and the output each one produces.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const PPTX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The format of a source document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// Presentation deck (Office Open XML).
    Pptx,
    /// Word-processing document (Office Open XML).
    Docx,
    /// PDF, translated through an intermediate word-processing document.
    Pdf,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from a path, rejecting unsupported extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "{} (only .pptx, .docx and .pdf files are allowed)",
                    path.display()
                ))
            })
    }

    /// Extension of the translated output. PDFs come out as word documents.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Docx | Self::Pdf => "docx",
        }
    }

    /// Media type of the translated output.
    pub fn output_media_type(self) -> &'static str {
        match self {
            Self::Pptx => PPTX_MEDIA_TYPE,
            Self::Docx | Self::Pdf => DOCX_MEDIA_TYPE,
        }
    }

    /// Name of the translated file for an input file name.
    pub fn output_file_name(self, input_name: &str) -> String {
        let stem = match input_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => input_name,
        };
        format!("translated_{}.{}", stem, self.output_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(DocumentFormat::from_extension("PPTX"), Some(DocumentFormat::Pptx));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("Pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("ppt"), None);
    }

    #[test]
    fn test_from_path_rejects_unsupported() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("deck.pptx")).unwrap(),
            DocumentFormat::Pptx
        );
        let err = DocumentFormat::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(err.is_unsupported_input());
        assert!(DocumentFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_output_shape() {
        assert_eq!(
            DocumentFormat::Pdf.output_file_name("report.pdf"),
            "translated_report.docx"
        );
        assert_eq!(
            DocumentFormat::Pptx.output_file_name("deck.v2.PPTX"),
            "translated_deck.v2.pptx"
        );
        assert_eq!(
            DocumentFormat::Pdf.output_media_type(),
            DocumentFormat::Docx.output_media_type()
        );
        assert!(DocumentFormat::Pptx.output_media_type().ends_with("presentation"));
    }
}
