//! Shared test fixtures: in-memory packages and a recording translation service.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::translate::TranslationService;

/// Build a ZIP package from `(path, contents)` pairs, in the given order.
pub fn build_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    drop(zip);
    buffer.into_inner()
}

/// Translation service double.
///
/// Answers `[<lang>] <text>`, records every request, and can be told to fail
/// or answer empty for specific strings.
#[derive(Default)]
pub struct RecordingService {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    empty: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn empty_on(mut self, text: &str) -> Self {
        self.empty.insert(text.to_string());
        self
    }

    /// Hold every request for `delay` so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Highest number of requests observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationService for RecordingService {
    fn name(&self) -> &str {
        "recording"
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<Option<String>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(Error::TranslationError(format!("refused {}", text)));
        }
        if self.empty.contains(text) {
            return Ok(None);
        }
        Ok(Some(format!("[{}] {}", target_lang, text)))
    }
}
