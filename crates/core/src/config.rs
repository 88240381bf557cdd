//! Translator configuration, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_TARGET_LANG: &str = "or";
pub const DEFAULT_SOURCE_LANG: &str = "auto";
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 5000;

/// Settings for the translation pipeline and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Target language code passed through to the service unchanged.
    pub target_lang: String,
    pub source_lang: String,
    /// Maximum number of in-flight translation requests.
    pub max_concurrency: usize,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    /// Longer strings are not sent and keep their original text.
    pub max_text_length: usize,
    pub converter: ConverterConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            max_concurrency: DEFAULT_CONCURRENCY,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            converter: ConverterConfig::default(),
        }
    }
}

impl TranslatorConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(source).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.max_concurrency = config.max_concurrency.max(1);
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }
}

/// External PDF to word-processing converter invocation.
///
/// `{input}`, `{output}` and `{start}` are substituted in `args`; `end_arg` is
/// appended with `{end}` substituted only when the page range has an end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub program: String,
    pub args: Vec<String>,
    pub end_arg: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "pdf2docx".to_string(),
            args: vec![
                "convert".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
                "--start={start}".to_string(),
            ],
            end_arg: "--end={end}".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.target_lang, "or");
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.max_text_length, 5000);
        assert_eq!(config.converter.program, "pdf2docx");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TranslatorConfig::from_toml_str(
            r#"
            target_lang = "hi"
            max_concurrency = 4

            [converter]
            program = "/opt/bin/pdf2docx"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_lang, "hi");
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.source_lang, "auto");
        assert_eq!(config.converter.program, "/opt/bin/pdf2docx");
        assert_eq!(config.converter.args.len(), 4);
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let config = TranslatorConfig::from_toml_str("max_concurrency = 0").unwrap();
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_invalid_toml() {
        let err = TranslatorConfig::from_toml_str("max_concurrency = \"many\"").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
