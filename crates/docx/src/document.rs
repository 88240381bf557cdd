//! The word-processing document: its main part and body content.

use std::path::Path;

use xlat_core::collect::{collect_paragraphs, collect_table};
use xlat_core::package::REL_OFFICE_DOCUMENT;
use xlat_core::{
    Package, Paragraph, Pipeline, Result, Run, Table, Translatable, TranslationStats, XmlPart,
};

use crate::parser::parse_body;

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// An opened `.docx` document.
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: Package,
    part: XmlPart,
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

impl WordDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let name = package
            .related_part("", REL_OFFICE_DOCUMENT)?
            .unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string());
        let part = package.read_part(&name)?;
        let body = parse_body(&part)?;

        log::debug!(
            "Loaded {} paragraphs and {} tables from {}",
            body.paragraphs.len(),
            body.tables.len(),
            name
        );

        Ok(Self {
            package,
            part,
            paragraphs: body.paragraphs,
            tables: body.tables,
        })
    }

    /// Package path of the main document part.
    pub fn part_name(&self) -> &str {
        self.part.name()
    }

    /// Every run, blank ones included: paragraphs first, then tables.
    pub fn runs(&self) -> Vec<&Run> {
        let mut runs: Vec<&Run> = self.paragraphs.iter().flat_map(|p| p.runs.iter()).collect();
        for table in &self.tables {
            table.visit_runs(&mut |run| runs.push(run));
        }
        runs
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let xml = self.part.render(self.runs());
        self.package.set(self.part.name(), xml.into_bytes());
        self.package.save(path)
    }
}

impl Translatable for WordDocument {
    fn collect_runs(&mut self) -> Vec<&mut Run> {
        let mut runs = Vec::new();
        collect_paragraphs(&mut self.paragraphs, &mut runs);
        for table in self.tables.iter_mut() {
            collect_table(table, &mut runs);
        }
        runs
    }
}

/// Translate a word-processing document and save the result to `output`.
pub async fn translate_docx(
    input: &Path,
    output: &Path,
    pipeline: &Pipeline,
) -> Result<TranslationStats> {
    let mut document = WordDocument::open(input).map_err(|e| {
        log::error!("Error loading document: {}", e);
        e
    })?;

    let stats = pipeline.run(&mut document).await;

    document.save(output)?;
    log::info!("Translated document saved to {}", output.display());
    Ok(stats)
}
