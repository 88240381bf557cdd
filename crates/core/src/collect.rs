//! Run collection: a depth-first, pre-order walk producing mutable references
//! to every non-blank run reachable from a node.
//!
//! The returned references borrow the document tree, so they cannot outlive it
//! or escape the pipeline that collected them.

use crate::types::{CellBlock, ChartFrame, Paragraph, Run, Shape, Table, TextBody};

/// A document whose runs can be collected for translation.
pub trait Translatable {
    /// Every non-blank run of the document, in document order.
    fn collect_runs(&mut self) -> Vec<&mut Run>;
}

/// Collect runs from a shape, recursing into groups.
pub fn collect_shape<'a>(shape: &'a mut Shape, out: &mut Vec<&'a mut Run>) {
    match shape {
        Shape::Group(children) => {
            for child in children.iter_mut() {
                collect_shape(child, out);
            }
        }
        Shape::Text(body) => collect_text_body(body, out),
        Shape::Table(table) => collect_table(table, out),
        Shape::Chart(frame) => collect_chart(frame, out),
        Shape::Other => {}
    }
}

pub fn collect_shapes<'a>(shapes: &'a mut [Shape], out: &mut Vec<&'a mut Run>) {
    for shape in shapes.iter_mut() {
        collect_shape(shape, out);
    }
}

pub fn collect_text_body<'a>(body: &'a mut TextBody, out: &mut Vec<&'a mut Run>) {
    collect_paragraphs(&mut body.paragraphs, out);
}

pub fn collect_paragraphs<'a>(paragraphs: &'a mut [Paragraph], out: &mut Vec<&'a mut Run>) {
    for paragraph in paragraphs.iter_mut() {
        collect_paragraph(paragraph, out);
    }
}

pub fn collect_paragraph<'a>(paragraph: &'a mut Paragraph, out: &mut Vec<&'a mut Run>) {
    out.extend(paragraph.runs.iter_mut().filter(|run| !run.is_blank()));
}

/// Collect runs row by row, cell by cell; inside a cell, paragraphs and nested
/// tables in the order they appear.
pub fn collect_table<'a>(table: &'a mut Table, out: &mut Vec<&'a mut Run>) {
    for row in table.rows.iter_mut() {
        for cell in row.cells.iter_mut() {
            for block in cell.blocks.iter_mut() {
                match block {
                    CellBlock::Paragraph(paragraph) => collect_paragraph(paragraph, out),
                    CellBlock::Table(nested) => collect_table(nested, out),
                }
            }
        }
    }
}

/// Chart title, then category-axis title, then value-axis title. Legends are skipped.
pub fn collect_chart<'a>(frame: &'a mut ChartFrame, out: &mut Vec<&'a mut Run>) {
    let Some(chart) = frame.chart.as_deref_mut() else {
        log::debug!("Chart {} unavailable, no runs collected", frame.rel_id);
        return;
    };

    for body in [
        &mut chart.title,
        &mut chart.category_axis_title,
        &mut chart.value_axis_title,
    ]
    .into_iter()
    .flatten()
    {
        collect_text_body(body, out);
    }
}
