//! Core of the office document translator: the document tree, run collection,
//! deduplicated concurrent translation, and in-place run rewriting.

pub mod batch;
pub mod collect;
pub mod config;
pub mod error;
pub mod format;
pub mod google;
pub mod package;
pub mod pipeline;
pub mod rewrite;
pub mod translate;
pub mod types;
pub mod xml;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use batch::{BatchOutcome, TranslationBatcher, TranslationMap};
pub use collect::Translatable;
pub use config::{ConverterConfig, TranslatorConfig};
pub use error::{Error, Result};
pub use format::DocumentFormat;
pub use package::{Package, Relationship};
pub use pipeline::{Pipeline, TranslationStats};
pub use translate::{TranslationClient, TranslationService};
pub use types::{
    CellBlock, Chart, ChartFrame, Paragraph, Run, Shape, Table, TableCell, TableRow, TextBody,
};
pub use xml::{Child, TextSpan, XmlCursor, XmlPart};
