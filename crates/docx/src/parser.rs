//! WordprocessingML body parsing.

use xlat_core::{
    CellBlock, Error, Paragraph, Result, Run, Table, TableCell, TableRow, XmlCursor, XmlPart,
};

/// Top-level content of a `w:body`.
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

/// Parse the direct paragraphs and tables of the part's `w:body`.
pub fn parse_body(part: &XmlPart) -> Result<Body> {
    let mut cursor = part.cursor();
    if !cursor.seek(b"body")? {
        return Err(Error::InvalidDocument(format!(
            "{} has no document body",
            part.name()
        )));
    }

    let mut body = Body::default();
    cursor.children(|cursor, child| {
        if child.empty {
            if child.local_name() == b"p" {
                body.paragraphs.push(Paragraph::default());
            }
            return Ok(false);
        }
        match child.local_name() {
            b"p" => body.paragraphs.push(parse_paragraph(cursor)?),
            b"tbl" => body.tables.push(parse_table(cursor)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(body)
}

/// Runs are the paragraph's `w:r` children plus those wrapped in `w:hyperlink`.
fn parse_paragraph(cursor: &mut XmlCursor<'_>) -> Result<Paragraph> {
    let mut paragraph = Paragraph::default();
    cursor.children(|cursor, child| {
        if child.empty {
            return Ok(false);
        }
        match child.local_name() {
            b"r" => paragraph.runs.push(parse_run(cursor)?),
            b"hyperlink" => cursor.children(|cursor, child| {
                if child.empty || child.local_name() != b"r" {
                    return Ok(false);
                }
                paragraph.runs.push(parse_run(cursor)?);
                Ok(true)
            })?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(paragraph)
}

/// Run text is its `w:t` content with `w:tab` read as `\t` and `w:br`/`w:cr` as `\n`.
fn parse_run(cursor: &mut XmlCursor<'_>) -> Result<Run> {
    let mut text = String::new();
    let mut spans = Vec::new();
    let mut segment = 0;
    cursor.children(|cursor, child| {
        match child.local_name() {
            b"t" if !child.empty => {
                let (chunk, mut span) = cursor.read_text(child.at, &child.element, true)?;
                span.segment = segment;
                text.push_str(&chunk);
                spans.push(span);
                return Ok(true);
            }
            b"tab" => text.push('\t'),
            b"br" | b"cr" => text.push('\n'),
            _ => return Ok(false),
        }
        segment += 1;
        Ok(false)
    })?;
    Ok(Run::new(text, spans))
}

fn parse_table(cursor: &mut XmlCursor<'_>) -> Result<Table> {
    let mut table = Table::default();
    cursor.children(|cursor, child| {
        if child.empty || child.local_name() != b"tr" {
            return Ok(false);
        }
        table.rows.push(parse_row(cursor)?);
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
        let cell = if child.empty {
            TableCell::default()
        } else {
            parse_cell(cursor)?
        };
        row.cells.push(cell);
        Ok(true)
    })?;
    Ok(row)
}

/// A cell holds paragraphs and, possibly, further tables.
fn parse_cell(cursor: &mut XmlCursor<'_>) -> Result<TableCell> {
    let mut cell = TableCell::default();
    cursor.children(|cursor, child| {
        if child.empty {
            if child.local_name() == b"p" {
                cell.blocks.push(CellBlock::Paragraph(Paragraph::default()));
            }
            return Ok(false);
        }
        let block = match child.local_name() {
            b"p" => CellBlock::Paragraph(parse_paragraph(cursor)?),
            b"tbl" => CellBlock::Table(parse_table(cursor)?),
            _ => return Ok(false),
        };
        cell.blocks.push(block);
        Ok(true)
    })?;
    Ok(cell)
}
