//! Error types for office document translation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while translating a document.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file extension is not one of the supported formats.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error inside a package part.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A part the document cannot do without is absent from the package.
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// The package opened but its structure is not a valid document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The external PDF converter could not produce an intermediate document.
    #[error("PDF conversion failed: {0}")]
    ConversionError(String),

    /// The translation service rejected or failed a request.
    #[error("Translation failed: {0}")]
    TranslationError(String),

    /// The translation service answered without usable text.
    #[error("Translation service returned no text")]
    EmptyTranslation,

    /// Transport-level failure talking to the translation service.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether this error is a user-facing rejection rather than a processing fault.
    pub fn is_unsupported_input(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_))
    }

    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        Self::XmlError(format!("{}: {}", part, err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ZipError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_input_classification() {
        assert!(Error::UnsupportedFormat("notes.txt".into()).is_unsupported_input());
        assert!(!Error::MissingPart("ppt/presentation.xml".into()).is_unsupported_input());
        assert!(!Error::EmptyTranslation.is_unsupported_input());
    }

    #[test]
    fn test_xml_error_names_part() {
        let err = Error::xml("ppt/slides/slide1.xml", "unexpected end");
        assert!(err.to_string().contains("ppt/slides/slide1.xml"));
        assert!(err.to_string().contains("unexpected end"));
    }
}
