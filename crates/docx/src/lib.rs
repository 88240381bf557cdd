//! DOCX (Office Open XML) word-processing document driver.
//!
//! Translates the runs of the main document body: top-level paragraphs, then
//! tables (including tables nested in cells). Every other part of the package
//! is written back unchanged.

pub mod document;
pub mod parser;

pub use document::{translate_docx, WordDocument};
