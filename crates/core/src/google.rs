//! HTTP backend for the public Google web translation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::translate::TranslationService;

pub struct GoogleTranslate {
    http: reqwest::Client,
    endpoint: String,
    source_lang: String,
}

impl GoogleTranslate {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            source_lang: config.source_lang.clone(),
        })
    }
}

#[async_trait]
impl TranslationService for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::TranslationError(format!(
                "service answered {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        Ok(parse_response(&body))
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The payload is a nested array whose first element lists
/// `[translated, original, ...]` segments.
fn parse_response(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0)?.as_str())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
