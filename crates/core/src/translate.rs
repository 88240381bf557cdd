//! Translation client adapter over an opaque text translation service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::google::GoogleTranslate;

/// An external text-to-text translation service.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Translate `text` into `target_lang`. `Ok(None)` means the service
    /// answered without a usable result.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<Option<String>>;
}

/// Adapter every translation request goes through.
///
/// Blank input is returned unchanged without reaching the service. Service
/// errors, empty answers and over-long input are all reported as errors; the
/// batcher decides what to fall back to.
#[derive(Clone)]
pub struct TranslationClient {
    service: Arc<dyn TranslationService>,
    max_text_length: usize,
}

impl TranslationClient {
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self {
            service,
            max_text_length: crate::config::DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    /// Build a client for the HTTP backend described by `config`.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        let service = GoogleTranslate::new(config)?;
        Ok(Self::new(Arc::new(service)).with_max_text_length(config.max_text_length))
    }

    /// Reject strings longer than `max` characters before calling the service.
    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(Error::TranslationError(format!(
                "text of {} characters exceeds the {} character limit",
                length, self.max_text_length
            )));
        }

        match self.service.translate(text, target_lang).await? {
            Some(translated) if !translated.is_empty() => Ok(translated),
            _ => Err(Error::EmptyTranslation),
        }
    }
}

/// First characters of `text` for log messages.
pub(crate) fn preview(text: &str) -> String {
    text.chars().take(20).collect()
}
