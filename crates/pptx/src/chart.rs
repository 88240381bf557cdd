//! Chart parts: the chart title, the category-axis title and the value-axis title.
//!
//! Legends are noted but never read; their entries are generated from series
//! data rather than stored as editable text.

use xlat_core::{Chart, Error, Result, TextBody, XmlCursor, XmlPart};

use crate::parser::parse_text_body;

#[derive(Default)]
struct ChartTexts {
    title: Option<TextBody>,
    category_axis_title: Option<TextBody>,
    value_axis_title: Option<TextBody>,
    seen_category_axis: bool,
    seen_value_axis: bool,
    has_legend: bool,
}

/// Parse a chart part (`c:chartSpace`).
pub fn parse_chart(part: XmlPart) -> Result<Chart> {
    let texts = {
        let mut cursor = part.cursor();
        if !cursor.seek(b"chartSpace")? {
            return Err(Error::InvalidDocument(format!(
                "{} is not a chart part",
                part.name()
            )));
        }
        let mut texts = ChartTexts::default();
        cursor.enter(b"chart", |cursor| texts.read_chart(cursor))?;
        texts
    };

    Ok(Chart {
        part,
        title: texts.title,
        category_axis_title: texts.category_axis_title,
        value_axis_title: texts.value_axis_title,
        has_legend: texts.has_legend,
    })
}

impl ChartTexts {
    fn read_chart(&mut self, cursor: &mut XmlCursor<'_>) -> Result<()> {
        cursor.children(|cursor, child| match child.local_name() {
            b"title" if !child.empty => {
                self.title = read_title(cursor)?;
                Ok(true)
            }
            b"plotArea" if !child.empty => {
                self.read_plot_area(cursor)?;
                Ok(true)
            }
            b"legend" => {
                self.has_legend = true;
                Ok(false)
            }
            _ => Ok(false),
        })
    }

    /// Only the first category (or date) axis and the first value axis count.
    fn read_plot_area(&mut self, cursor: &mut XmlCursor<'_>) -> Result<()> {
        cursor.children(|cursor, child| match child.local_name() {
            b"catAx" | b"dateAx" if !self.seen_category_axis => {
                self.seen_category_axis = true;
                if child.empty {
                    return Ok(false);
                }
                self.category_axis_title = read_axis_title(cursor)?;
                Ok(true)
            }
            b"valAx" if !self.seen_value_axis => {
                self.seen_value_axis = true;
                if child.empty {
                    return Ok(false);
                }
                self.value_axis_title = read_axis_title(cursor)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }
}

fn read_axis_title(cursor: &mut XmlCursor<'_>) -> Result<Option<TextBody>> {
    let mut title = None;
    cursor.enter(b"title", |cursor| {
        title = read_title(cursor)?;
        Ok(())
    })?;
    Ok(title)
}

/// A `c:title` has editable text only when it holds rich text (`c:tx/c:rich`).
fn read_title(cursor: &mut XmlCursor<'_>) -> Result<Option<TextBody>> {
    let mut body = None;
    cursor.enter(b"tx", |cursor| {
        cursor.enter(b"rich", |cursor| {
            body = Some(parse_text_body(cursor)?);
            Ok(())
        })
    })?;
    Ok(body)
}
