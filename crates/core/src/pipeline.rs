//! Collect, translate, rewrite: the format-independent part of every driver.

use serde::Serialize;

use crate::batch::TranslationBatcher;
use crate::collect::Translatable;
use crate::config::{TranslatorConfig, DEFAULT_CONCURRENCY};
use crate::error::Result;
use crate::rewrite::apply_translations;
use crate::translate::TranslationClient;

/// Counts reported for one translated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    /// Non-blank runs collected.
    pub runs: usize,
    /// Distinct texts among them, one translation request each.
    pub unique_texts: usize,
    /// Runs whose text changed.
    pub translated: usize,
    /// Distinct texts that kept their original text after a failed request.
    pub fallbacks: usize,
}

/// A translation client bound to a target language and a worker limit.
#[derive(Clone)]
pub struct Pipeline {
    client: TranslationClient,
    target_lang: String,
    max_concurrency: usize,
}

impl Pipeline {
    pub fn new(client: TranslationClient, target_lang: impl Into<String>) -> Self {
        Self {
            client,
            target_lang: target_lang.into(),
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Build the HTTP client and pipeline described by `config`.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        let client = TranslationClient::from_config(config)?;
        Ok(Self::new(client, config.target_lang.clone()).with_concurrency(config.max_concurrency))
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Translate every run of `document` in place.
    ///
    /// Never fails: a request that cannot be translated keeps its original text.
    pub async fn run<D: Translatable + ?Sized>(&self, document: &mut D) -> TranslationStats {
        let mut runs = document.collect_runs();
        log::info!(
            "Found {} text runs to translate into {} with {}.",
            runs.len(),
            self.target_lang,
            self.client.service_name()
        );

        let outcome = TranslationBatcher::new(&self.client)
            .with_concurrency(self.max_concurrency)
            .translate(&runs, &self.target_lang)
            .await;
        log::info!(
            "Found {} unique text strings ({} kept original text).",
            outcome.translations.len(),
            outcome.fallbacks
        );

        let translated = apply_translations(&mut runs, &outcome.translations);

        TranslationStats {
            runs: runs.len(),
            unique_texts: outcome.translations.len(),
            translated,
            fallbacks: outcome.fallbacks,
        }
    }
}
