//! CLI tool for translating presentations, word documents and PDFs.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use xlat_core::{DocumentFormat, Pipeline, TranslationStats, TranslatorConfig};
use xlat_pdf::{CommandConverter, PdfConverter};

/// Translate the text of office documents while keeping their formatting.
#[derive(Parser, Debug)]
#[command(name = "xlat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s) (.pptx, .docx or .pdf)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory, or output file for a single input (default: next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target language code (default: "or")
    #[arg(short = 't', long = "target")]
    target_lang: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of concurrent translation requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Translation service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// PDF to DOCX converter program
    #[arg(long)]
    converter: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(&args)?;
    let pipeline = Pipeline::from_config(&config).context("Failed to set up the translator")?;
    let converter = CommandConverter::new(config.converter.clone());
    log::debug!("Target language: {}", pipeline.target_lang());

    let single = args.input.len() == 1;
    let mut failures = 0;

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args, single, &pipeline, &converter).await {
            Ok((output_path, format, stats)) => {
                println!("{}\t{}", output_path.display(), format.output_media_type());
                if args.verbose {
                    eprintln!(
                        "  {} runs, {} unique texts, {} translated, {} kept original",
                        stats.runs, stats.unique_texts, stats.translated, stats.fallbacks
                    );
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, args.input.len());
    }
    Ok(())
}

/// Configuration file (if any) with command-line overrides applied.
fn load_config(args: &Args) -> Result<TranslatorConfig> {
    let mut config = match &args.config {
        Some(path) => TranslatorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TranslatorConfig::default(),
    };

    if let Some(lang) = &args.target_lang {
        config.target_lang = lang.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency.max(1);
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(program) = &args.converter {
        config.converter.program = program.clone();
    }
    Ok(config)
}

/// Translate one file. A failed translation removes whatever sits at the output path.
async fn process_file(
    input_path: &Path,
    args: &Args,
    single: bool,
    pipeline: &Pipeline,
    converter: &dyn PdfConverter,
) -> Result<(PathBuf, DocumentFormat, TranslationStats)> {
    let format = DocumentFormat::from_path(input_path)?;
    let output_path = get_output_path(input_path, format, args.output.as_deref(), single)?;
    log::debug!(
        "Translating {} as {:?} into {}",
        input_path.display(),
        format,
        output_path.display()
    );

    let result = match format {
        DocumentFormat::Pptx => xlat_pptx::translate_pptx(input_path, &output_path, pipeline).await,
        DocumentFormat::Docx => xlat_docx::translate_docx(input_path, &output_path, pipeline).await,
        DocumentFormat::Pdf => {
            xlat_pdf::translate_pdf(input_path, &output_path, pipeline, converter).await
        }
    };

    match result {
        Ok(stats) => Ok((output_path, format, stats)),
        Err(e) => {
            remove_partial_output(&output_path);
            Err(e).with_context(|| format!("Failed to translate {}", input_path.display()))
        }
    }
}

fn remove_partial_output(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Determine the output path for a translated file.
fn get_output_path(
    input_path: &Path,
    format: DocumentFormat,
    output: Option<&Path>,
    single: bool,
) -> Result<PathBuf> {
    let input_name = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let output_filename = format.output_file_name(input_name);

    let output_path = match output {
        Some(file) if single && file.extension().is_some() => file.to_path_buf(),
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["xlat", "deck.pptx"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_output_next_to_input() {
        let path = get_output_path(
            Path::new("/data/report.pdf"),
            DocumentFormat::Pdf,
            None,
            true,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/data/translated_report.docx"));
    }

    #[test]
    fn test_output_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");

        let path = get_output_path(
            Path::new("deck.pptx"),
            DocumentFormat::Pptx,
            Some(&out_dir),
            false,
        )
        .unwrap();

        assert_eq!(path, out_dir.join("translated_deck.pptx"));
        assert!(out_dir.is_dir());
    }

    #[test]
    fn test_explicit_output_file_for_single_input() {
        let path = get_output_path(
            Path::new("notes.docx"),
            DocumentFormat::Docx,
            Some(Path::new("/tmp/result.docx")),
            true,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/result.docx"));
    }

    #[test]
    fn test_flags_override_config() {
        let config = load_config(&args(&["-t", "hi", "--concurrency", "0", "--converter", "/opt/pdf2docx"])).unwrap();
        assert_eq!(config.target_lang, "hi");
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.converter.program, "/opt/pdf2docx");
        assert_eq!(config.source_lang, "auto");
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xlat.toml");
        std::fs::write(&path, "target_lang = \"ta\"\nmax_concurrency = 3\n").unwrap();

        let config = load_config(&args(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(config.target_lang, "ta");
        assert_eq!(config.max_concurrency, 3);

        let config = load_config(&args(&["--config", path.to_str().unwrap(), "-t", "bn"])).unwrap();
        assert_eq!(config.target_lang, "bn");
    }

    #[tokio::test]
    async fn test_unsupported_input_rejected_before_opening() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        let cli = args(&[]);
        let pipeline = Pipeline::from_config(&TranslatorConfig::default()).unwrap();
        let converter = CommandConverter::default();

        let err = process_file(&input, &cli, true, &pipeline, &converter)
            .await
            .unwrap_err();

        let err = err.downcast::<xlat_core::Error>().unwrap();
        assert!(err.is_unsupported_input());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_translation_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.docx");
        std::fs::write(&input, b"not a document").unwrap();
        let stale = dir.path().join("translated_broken.docx");
        std::fs::write(&stale, b"old output").unwrap();

        let cli = args(&[]);
        let pipeline = Pipeline::from_config(&TranslatorConfig::default()).unwrap();
        let converter = CommandConverter::default();

        assert!(process_file(&input, &cli, true, &pipeline, &converter)
            .await
            .is_err());
        assert!(!stale.exists());
    }
}
