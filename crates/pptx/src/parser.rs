//! DrawingML parsing for slides, slide layouts and slide masters.
//!
//! Only what the document tree models is read: shape nesting, text bodies,
//! tables and chart references. Everything else is skipped unparsed and stays
//! in the part source as-is.

use quick_xml::events::BytesStart;
use xlat_core::xml::attribute;
use xlat_core::{
    ChartFrame, Error, Package, Paragraph, Relationship, Result, Run, Shape, Table, TableCell,
    TableRow, TextBody, XmlCursor, XmlPart,
};

use crate::chart::parse_chart;

/// Shape-tree parser for one slide, layout or master part.
///
/// Chart frames are resolved through the part's relationships while parsing.
pub struct ShapeTreeParser<'p> {
    package: &'p Package,
    part: &'p XmlPart,
    rels: Vec<Relationship>,
}

impl<'p> ShapeTreeParser<'p> {
    pub fn new(package: &'p Package, part: &'p XmlPart) -> Result<Self> {
        let rels = package.relationships(part.name())?;
        Ok(Self {
            package,
            part,
            rels,
        })
    }

    /// Parse the part's `p:spTree`. A part without one has no shapes.
    pub fn parse(&self) -> Result<Vec<Shape>> {
        let mut cursor = self.part.cursor();
        if !cursor.seek(b"spTree")? {
            log::debug!("{} has no shape tree", self.part.name());
            return Ok(Vec::new());
        }
        self.parse_shapes(&mut cursor)
    }

    /// Parse the shapes inside a `p:spTree` or `p:grpSp`.
    fn parse_shapes(&self, cursor: &mut XmlCursor<'_>) -> Result<Vec<Shape>> {
        let mut shapes = Vec::new();
        cursor.children(|cursor, child| {
            let name = child.local_name();
            if child.empty {
                if is_shape(name) {
                    shapes.push(Shape::Other);
                }
                return Ok(false);
            }
            match name {
                b"sp" => shapes.push(parse_sp(cursor)?),
                b"grpSp" => shapes.push(Shape::Group(self.parse_shapes(cursor)?)),
                b"graphicFrame" => shapes.push(self.parse_graphic_frame(cursor)?),
                other if is_shape(other) => {
                    shapes.push(Shape::Other);
                    return Ok(false);
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(shapes)
    }

    /// A graphic frame holds a table, a chart, or something we leave alone.
    fn parse_graphic_frame(&self, cursor: &mut XmlCursor<'_>) -> Result<Shape> {
        let mut shape = Shape::Other;
        cursor.enter(b"graphic", |cursor| {
            cursor.enter(b"graphicData", |cursor| {
                cursor.children(|cursor, child| match child.local_name() {
                    b"tbl" if !child.empty => {
                        shape = Shape::Table(parse_table(cursor)?);
                        Ok(true)
                    }
                    b"chart" => {
                        shape = Shape::Chart(self.chart_frame(&child.element));
                        Ok(false)
                    }
                    _ => Ok(false),
                })
            })
        })?;
        Ok(shape)
    }

    /// Resolve a `c:chart` reference. A chart that cannot be loaded is kept
    /// as a frame without content and contributes no runs.
    fn chart_frame(&self, element: &BytesStart<'_>) -> ChartFrame {
        let rel_id = attribute(element, b"id", true).unwrap_or_default();
        let chart = match self.load_chart(&rel_id) {
            Ok(chart) => Some(Box::new(chart)),
            Err(e) => {
                log::warn!("Error processing chart: {}", e);
                None
            }
        };
        ChartFrame { rel_id, chart }
    }

    fn load_chart(&self, rel_id: &str) -> Result<xlat_core::Chart> {
        let rel = self
            .rels
            .iter()
            .find(|rel| rel.id == rel_id && !rel.external)
            .ok_or_else(|| {
                Error::MissingPart(format!(
                    "chart relationship '{}' of {}",
                    rel_id,
                    self.part.name()
                ))
            })?;
        parse_chart(self.package.read_part(&rel.target)?)
    }
}

fn is_shape(name: &[u8]) -> bool {
    matches!(
        name,
        b"sp" | b"grpSp" | b"graphicFrame" | b"cxnSp" | b"pic" | b"contentPart" | b"AlternateContent"
    )
}

/// An auto shape: text when it has a text body, otherwise nothing to collect.
fn parse_sp(cursor: &mut XmlCursor<'_>) -> Result<Shape> {
    let mut shape = Shape::Other;
    cursor.children(|cursor, child| {
        if child.empty || child.local_name() != b"txBody" {
            return Ok(false);
        }
        shape = Shape::Text(parse_text_body(cursor)?);
        Ok(true)
    })?;
    Ok(shape)
}

/// Parse the paragraphs of an `a:txBody`-like element (`p:txBody`, `a:txBody`, `c:rich`).
pub fn parse_text_body(cursor: &mut XmlCursor<'_>) -> Result<TextBody> {
    let mut body = TextBody::default();
    cursor.children(|cursor, child| {
        if child.local_name() != b"p" {
            return Ok(false);
        }
        let paragraph = if child.empty {
            Paragraph::default()
        } else {
            parse_paragraph(cursor)?
        };
        body.paragraphs.push(paragraph);
        Ok(true)
    })?;
    Ok(body)
}

/// Only `a:r` elements are runs; fields and line breaks are left alone.
fn parse_paragraph(cursor: &mut XmlCursor<'_>) -> Result<Paragraph> {
    let mut paragraph = Paragraph::default();
    cursor.children(|cursor, child| {
        if child.local_name() != b"r" {
            return Ok(false);
        }
        let run = if child.empty {
            Run::new("", Vec::new())
        } else {
            parse_run(cursor)?
        };
        paragraph.runs.push(run);
        Ok(true)
    })?;
    Ok(paragraph)
}

fn parse_run(cursor: &mut XmlCursor<'_>) -> Result<Run> {
    let mut text = String::new();
    let mut spans = Vec::new();
    cursor.children(|cursor, child| {
        if child.empty || child.local_name() != b"t" {
            return Ok(false);
        }
        let (chunk, span) = cursor.read_text(child.at, &child.element, false)?;
        text.push_str(&chunk);
        spans.push(span);
        Ok(true)
    })?;
    Ok(Run::new(text, spans))
}

fn parse_table(cursor: &mut XmlCursor<'_>) -> Result<Table> {
    let mut table = Table::default();
    cursor.children(|cursor, child| {
        if child.local_name() != b"tr" {
            return Ok(false);
        }
        let row = if child.empty {
            TableRow::default()
        } else {
            parse_row(cursor)?
        };
        table.rows.push(row);
        Ok(true)
    })?;
    Ok(table)
}

fn parse_row(cursor: &mut XmlCursor<'_>) -> Result<TableRow> {
    let mut row = TableRow::default();
    cursor.children(|cursor, child| {
        if child.local_name() != b"tc" {
            return Ok(false);
        }
        let mut cell = TableCell::default();
        if !child.empty {
            cursor.children(|cursor, child| {
                if child.empty || child.local_name() != b"txBody" {
                    return Ok(false);
                }
                cell = parse_text_body(cursor)?.into();
                Ok(true)
            })?;
        }
        row.cells.push(cell);
        Ok(true)
    })?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlat_core::testing::build_package;
    use xlat_core::types::shape_runs;

    fn texts(shapes: &[Shape]) -> Vec<&str> {
        shape_runs(shapes).into_iter().map(Run::text).collect()
    }

    fn slide(tree: &str) -> String {
        format!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            tree
        )
    }

    fn parse(xml: &str) -> Vec<Shape> {
        let package = Package::from_bytes(&build_package(&[("ppt/slides/slide1.xml", xml)])).unwrap();
        let part = package.read_part("ppt/slides/slide1.xml").unwrap();
        ShapeTreeParser::new(&package, &part).unwrap().parse().unwrap()
    }

    #[test]
    fn test_text_shape_runs_in_order() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr/><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"/><a:t>Hello</a:t></a:r><a:r><a:t> world</a:t></a:r></a:p><a:p><a:fld id="1"><a:t>3</a:t></a:fld><a:r><a:t>Again</a:t></a:r><a:endParaRPr/></a:p></p:txBody></p:sp>"#,
        );
        let shapes = parse(&xml);

        assert_eq!(shapes.len(), 1);
        let Shape::Text(body) = &shapes[0] else {
            panic!("expected a text shape");
        };
        assert_eq!(body.paragraphs.len(), 2);
        assert_eq!(texts(&shapes), vec!["Hello", " world", "Again"]);
    }

    #[test]
    fn test_groups_pictures_and_empty_shapes() {
        let xml = slide(
            r#"<p:grpSp><p:nvGrpSpPr/><p:grpSpPr/><p:sp><p:txBody><a:p><a:r><a:t>Inner</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:blipFill/></p:pic></p:grpSp><p:sp><p:spPr/></p:sp><p:cxnSp/>"#,
        );
        let shapes = parse(&xml);

        assert_eq!(shapes.len(), 3);
        let Shape::Group(children) = &shapes[0] else {
            panic!("expected a group");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[1], Shape::Other));
        assert!(matches!(shapes[1], Shape::Other));
        assert!(matches!(shapes[2], Shape::Other));
        assert_eq!(texts(&shapes), vec!["Inner"]);
    }

    #[test]
    fn test_table_rows_and_cells() {
        let xml = slide(
            r#"<p:graphicFrame><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid><a:gridCol/></a:tblGrid><a:tr><a:tc><a:txBody><a:p><a:r><a:t>A1</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>B1</a:t></a:r></a:p></a:txBody></a:tc></a:tr><a:tr><a:tc><a:txBody><a:p/></a:txBody></a:tc><a:tc/></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        );
        let shapes = parse(&xml);

        let Shape::Table(table) = &shapes[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.dimensions(), vec![2, 2]);
        assert_eq!(texts(&shapes), vec!["A1", "B1"]);
    }

    #[test]
    fn test_unresolvable_chart_is_kept_without_content() {
        let xml = slide(
            r#"<p:graphicFrame><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="rId9"/></a:graphicData></a:graphic></p:graphicFrame>"#,
        );
        let shapes = parse(&xml);

        let Shape::Chart(frame) = &shapes[0] else {
            panic!("expected a chart frame");
        };
        assert_eq!(frame.rel_id, "rId9");
        assert!(frame.chart.is_none());
    }

    #[test]
    fn test_part_without_shape_tree() {
        assert!(parse("<p:sld/>").is_empty());
    }

    #[test]
    fn test_escaped_text_is_decoded() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>Fish &amp; Chips</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(texts(&parse(&xml)), vec!["Fish & Chips"]);
    }
}
