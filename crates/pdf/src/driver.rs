//! Convert, translate, clean up.

use std::path::Path;

use xlat_core::{Pipeline, Result, TranslationStats};
use xlat_docx::translate_docx;

use crate::converter::{PageRange, PdfConverter};

/// Translate a PDF into a `.docx` written to `output`.
///
/// The intermediate document lives in a private temporary directory that is
/// removed whether conversion or translation succeeds or not.
pub async fn translate_pdf(
    input: &Path,
    output: &Path,
    pipeline: &Pipeline,
    converter: &dyn PdfConverter,
) -> Result<TranslationStats> {
    let workdir = tempfile::Builder::new().prefix("xlat-pdf-").tempdir()?;
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let intermediate = workdir.path().join(format!("{}_temp.docx", stem));

    log::info!(
        "Converting {} with {}",
        input.display(),
        converter.name()
    );
    let result = match converter
        .convert(input, &intermediate, PageRange::full())
        .await
    {
        Ok(()) => {
            log::info!("Converted PDF to DOCX: {}", intermediate.display());
            translate_docx(&intermediate, output, pipeline).await
        }
        Err(e) => {
            log::error!("Error converting PDF to DOCX: {}", e);
            Err(e)
        }
    };

    let workdir_path = workdir.path().to_path_buf();
    if let Err(e) = workdir.close() {
        log::warn!("Could not remove {}: {}", workdir_path.display(), e);
    }
    result
}
