//! Deduplicated, concurrency-bounded translation of collected runs.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::config::DEFAULT_CONCURRENCY;
use crate::error::Error;
use crate::translate::{preview, TranslationClient};
use crate::types::Run;

/// Original run text to translated text, exact-match keyed.
pub type TranslationMap = HashMap<String, String>;

/// Result of one batch: a translation for every distinct text.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub translations: TranslationMap,
    /// Distinct texts that kept their original text after a failed request.
    pub fallbacks: usize,
}

/// Sends one request per distinct run text, at most `max_concurrency` at a time.
pub struct TranslationBatcher<'c> {
    client: &'c TranslationClient,
    max_concurrency: usize,
}

impl<'c> TranslationBatcher<'c> {
    pub fn new(client: &'c TranslationClient) -> Self {
        Self {
            client,
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Distinct texts among `runs`. Order is not significant.
    pub fn unique_texts<'r>(runs: &'r [&mut Run]) -> HashSet<&'r str> {
        runs.iter().map(|run| run.text()).collect()
    }

    /// Translate every distinct text and wait for all requests to settle.
    ///
    /// A failed request maps its text to itself; it never affects other texts.
    pub async fn translate(&self, runs: &[&mut Run], target_lang: &str) -> BatchOutcome {
        let unique = Self::unique_texts(runs);
        let semaphore = Semaphore::new(self.max_concurrency);

        let tasks = unique.into_iter().map(|text| {
            let semaphore = &semaphore;
            async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => self.client.translate(text, target_lang).await,
                    Err(e) => Err(Error::TranslationError(format!(
                        "worker pool unavailable: {}",
                        e
                    ))),
                };
                (text, result)
            }
        });

        let mut outcome = BatchOutcome::default();
        for (text, result) in join_all(tasks).await {
            let translated = match result {
                Ok(translated) => translated,
                Err(e) => {
                    log::warn!("Error translating text: {}... Error: {}", preview(text), e);
                    outcome.fallbacks += 1;
                    text.to_string()
                }
            };
            outcome.translations.insert(text.to_string(), translated);
        }
        outcome
    }
}
