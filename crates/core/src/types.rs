//! Document tree shared by every format: runs, paragraphs, tables, charts and shapes.

use crate::xml::{TextSpan, XmlPart};

/// The smallest styled text unit within a paragraph.
///
/// Formatting is never modeled; it stays in the part source untouched. A run
/// only knows its text and where that text lives in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    text: String,
    original: String,
    spans: Vec<TextSpan>,
}

impl Run {
    /// Create a run from its parsed text and the spans it was read from.
    pub fn new(text: impl Into<String>, spans: Vec<TextSpan>) -> Self {
        let text = text.into();
        Self {
            original: text.clone(),
            text,
            spans,
        }
    }

    /// Current text of the run.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text as it was parsed from the source.
    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// Replace the run text. No other attribute of the run is touched.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Whether the text differs from the parsed text.
    pub fn is_modified(&self) -> bool {
        self.text != self.original
    }

    /// Empty or whitespace-only runs are never translated.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }
}

/// A paragraph and its runs, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

/// A text container: an ordered list of paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
}

impl TextBody {
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs.iter().flat_map(|p| p.runs.iter())
    }
}

/// A table: rows top-to-bottom, cells left-to-right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// A table cell: its paragraphs and nested tables in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub blocks: Vec<CellBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellBlock {
    Paragraph(Paragraph),
    /// Only word-processing cells nest tables.
    Table(Table),
}

impl TableCell {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            CellBlock::Paragraph(paragraph) => Some(paragraph),
            CellBlock::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            CellBlock::Table(table) => Some(table),
            CellBlock::Paragraph(_) => None,
        })
    }
}

impl From<TextBody> for TableCell {
    fn from(body: TextBody) -> Self {
        Self {
            blocks: body.paragraphs.into_iter().map(CellBlock::Paragraph).collect(),
        }
    }
}

impl Table {
    /// Row count and the cell count of each row.
    pub fn dimensions(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.cells.len()).collect()
    }

    pub fn visit_runs<'s, F: FnMut(&'s Run)>(&'s self, f: &mut F) {
        for cell in self.rows.iter().flat_map(|row| row.cells.iter()) {
            for block in &cell.blocks {
                match block {
                    CellBlock::Paragraph(paragraph) => paragraph.runs.iter().for_each(&mut *f),
                    CellBlock::Table(nested) => nested.visit_runs(f),
                }
            }
        }
    }
}

/// A chart part and the text elements that may carry translatable runs.
#[derive(Debug, Clone)]
pub struct Chart {
    pub part: XmlPart,
    pub title: Option<TextBody>,
    pub category_axis_title: Option<TextBody>,
    pub value_axis_title: Option<TextBody>,
    /// Legend entries are generated from series data and are never collected.
    pub has_legend: bool,
}

impl Chart {
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        [
            &self.title,
            &self.category_axis_title,
            &self.value_axis_title,
        ]
        .into_iter()
        .flatten()
        .flat_map(|body| body.runs())
    }

    /// Chart XML with translated titles spliced in.
    pub fn render(&self) -> String {
        self.part.render(self.runs())
    }
}

/// A chart reference on a slide. `chart` is `None` when the chart part could
/// not be inspected; such a chart contributes no runs.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub rel_id: String,
    pub chart: Option<Box<Chart>>,
}

/// The closed set of node kinds in a deck's shape tree.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A group containing child shapes, recursively.
    Group(Vec<Shape>),
    /// A plain text container (text boxes, placeholders, auto shapes).
    Text(TextBody),
    Table(Table),
    Chart(ChartFrame),
    /// Pictures, connectors and anything else without collectable text.
    Other,
}

impl Shape {
    /// Visit the runs stored in the part that owns this shape.
    ///
    /// Chart runs live in their own part and are reached through [`Shape::charts`].
    pub fn visit_runs<'s, F: FnMut(&'s Run)>(&'s self, f: &mut F) {
        match self {
            Shape::Group(children) => {
                for child in children {
                    child.visit_runs(f);
                }
            }
            Shape::Text(body) => body.runs().for_each(&mut *f),
            Shape::Table(table) => table.visit_runs(f),
            Shape::Chart(_) | Shape::Other => {}
        }
    }

    /// Every successfully loaded chart reachable from this shape.
    pub fn charts(&self) -> Vec<&Chart> {
        match self {
            Shape::Group(children) => children.iter().flat_map(Shape::charts).collect(),
            Shape::Chart(frame) => frame.chart.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// All runs owned directly by a part's shape list, in document order.
pub fn shape_runs<'a>(shapes: &'a [Shape]) -> Vec<&'a Run> {
    let mut runs = Vec::new();
    for shape in shapes {
        shape.visit_runs(&mut |run: &'a Run| runs.push(run));
    }
    runs
}
