//! PPTX (Office Open XML) deck driver.
//!
//! Loads a presentation package into the shared document tree, translates
//! every run on slides, slide masters, slide layouts and charts, and writes
//! the rewritten parts back into an otherwise untouched package.

pub mod chart;
pub mod deck;
pub mod parser;

pub use deck::{translate_pptx, Deck, MasterPart, SlidePart};
