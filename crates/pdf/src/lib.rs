//! PDF driver.
//!
//! A PDF is converted to a word-processing document by an external converter,
//! and that intermediate is translated by the DOCX driver. The output is always
//! a `.docx`.

pub mod converter;
pub mod driver;

pub use converter::{CommandConverter, PageRange, PdfConverter};
pub use driver::translate_pdf;
