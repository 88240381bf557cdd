//! PDF to word-processing conversion.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use xlat_core::{ConverterConfig, Error, Result};

/// Zero-based page range to convert. `end: None` runs to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    /// Every page of the document.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Converts a PDF file into a `.docx` file.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Write the converted document to `output`.
    async fn convert(&self, input: &Path, output: &Path, pages: PageRange) -> Result<()>;
}

/// Runs an external converter program, `pdf2docx` by default.
#[derive(Debug, Clone, Default)]
pub struct CommandConverter {
    config: ConverterConfig,
}

impl CommandConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Replace the program, keeping the argument template.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.config.program = program.into();
        self
    }

    /// Arguments with the placeholders filled in.
    pub fn command_args(&self, input: &Path, output: &Path, pages: PageRange) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let start = pages.start.to_string();
        let fill = |template: &str| {
            template
                .replace("{input}", &input)
                .replace("{output}", &output)
                .replace("{start}", &start)
        };

        let mut args: Vec<String> = self.config.args.iter().map(|arg| fill(arg.as_str())).collect();
        if let Some(end) = pages.end {
            if !self.config.end_arg.is_empty() {
                args.push(fill(self.config.end_arg.as_str()).replace("{end}", &end.to_string()));
            }
        }
        args
    }
}

#[async_trait]
impl PdfConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn convert(&self, input: &Path, output: &Path, pages: PageRange) -> Result<()> {
        let args = self.command_args(input, output, pages);
        log::debug!("Running {} {}", self.config.program, args.join(" "));

        let result = Command::new(&self.config.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                Error::ConversionError(format!("failed to run {}: {}", self.config.program, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::ConversionError(format!(
                "{} failed ({}): {}",
                self.config.program,
                result.status,
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(Error::ConversionError(format!(
                "{} produced no output at {}",
                self.config.program,
                output.display()
            )));
        }
        Ok(())
    }
}
