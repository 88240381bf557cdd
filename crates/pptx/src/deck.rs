//! The presentation graph: slides, slide masters and their layouts.

use std::cmp::Ordering;
use std::path::Path;

use quick_xml::events::Event;
use xlat_core::collect::collect_shapes;
use xlat_core::package::REL_OFFICE_DOCUMENT;
use xlat_core::types::shape_runs;
use xlat_core::xml::{attribute, local_name};
use xlat_core::{
    Chart, Package, Pipeline, Result, Run, Shape, Translatable, TranslationStats, XmlPart,
};

use crate::parser::ShapeTreeParser;

pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// A slide, layout or master part with its parsed shape tree.
#[derive(Debug, Clone)]
pub struct SlidePart {
    pub part: XmlPart,
    pub shapes: Vec<Shape>,
}

impl SlidePart {
    fn load(package: &Package, name: &str) -> Result<Self> {
        let part = package.read_part(name)?;
        let shapes = ShapeTreeParser::new(package, &part)?.parse()?;
        Ok(Self { part, shapes })
    }

    pub fn name(&self) -> &str {
        self.part.name()
    }

    /// Runs stored in this part, in document order. Chart runs are not included.
    pub fn runs(&self) -> Vec<&Run> {
        shape_runs(&self.shapes)
    }

    pub fn charts(&self) -> Vec<&Chart> {
        self.shapes.iter().flat_map(Shape::charts).collect()
    }

    /// The part source with the current text of its runs spliced in.
    pub fn render(&self) -> String {
        self.part.render(self.runs())
    }
}

/// A slide master and the layouts it owns.
#[derive(Debug, Clone)]
pub struct MasterPart {
    pub master: SlidePart,
    pub layouts: Vec<SlidePart>,
}

/// An opened presentation.
#[derive(Debug, Clone)]
pub struct Deck {
    package: Package,
    pub slides: Vec<SlidePart>,
    pub masters: Vec<MasterPart>,
}

impl Deck {
    /// Open and parse a `.pptx` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let presentation_name = package
            .related_part("", REL_OFFICE_DOCUMENT)?
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string());
        let presentation = package.read_part(&presentation_name)?;

        let slides = ordered_targets(&package, &presentation, b"sldId", REL_SLIDE)?
            .iter()
            .map(|name| SlidePart::load(&package, name))
            .collect::<Result<Vec<_>>>()?;

        let mut masters = Vec::new();
        for name in ordered_targets(&package, &presentation, b"sldMasterId", REL_SLIDE_MASTER)? {
            let master = SlidePart::load(&package, &name)?;
            let layouts = ordered_targets(&package, &master.part, b"sldLayoutId", REL_SLIDE_LAYOUT)?
                .iter()
                .map(|name| SlidePart::load(&package, name))
                .collect::<Result<Vec<_>>>()?;
            masters.push(MasterPart { master, layouts });
        }

        log::debug!(
            "Loaded {} slides and {} slide masters from {}",
            slides.len(),
            masters.len(),
            presentation_name
        );

        Ok(Self {
            package,
            slides,
            masters,
        })
    }

    /// Every slide, master and layout part, in collection order.
    pub fn parts(&self) -> impl Iterator<Item = &SlidePart> {
        self.slides.iter().chain(
            self.masters
                .iter()
                .flat_map(|m| std::iter::once(&m.master).chain(m.layouts.iter())),
        )
    }

    /// Every run in the deck, blank ones included, in collection order.
    pub fn runs(&self) -> Vec<&Run> {
        let mut runs = Vec::new();
        for part in self.parts() {
            runs.extend(part.runs());
            runs.extend(part.charts().into_iter().flat_map(|chart| chart.runs()));
        }
        runs
    }

    /// Write the deck to `path`, rendering every slide, layout, master and chart part.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let rendered: Vec<(String, String)> = self
            .parts()
            .flat_map(|part| {
                std::iter::once((part.name().to_string(), part.render())).chain(
                    part.charts()
                        .into_iter()
                        .map(|chart| (chart.part.name().to_string(), chart.render())),
                )
            })
            .collect();

        for (name, xml) in rendered {
            self.package.set(&name, xml.into_bytes());
        }
        self.package.save(path)
    }
}

impl Translatable for Deck {
    /// Slides first, then each master followed by its layouts.
    fn collect_runs(&mut self) -> Vec<&mut Run> {
        let mut runs = Vec::new();
        for slide in self.slides.iter_mut() {
            collect_shapes(&mut slide.shapes, &mut runs);
        }
        for master in self.masters.iter_mut() {
            collect_shapes(&mut master.master.shapes, &mut runs);
            for layout in master.layouts.iter_mut() {
                collect_shapes(&mut layout.shapes, &mut runs);
            }
        }
        runs
    }
}

/// Translate a presentation and save the result to `output`.
pub async fn translate_pptx(
    input: &Path,
    output: &Path,
    pipeline: &Pipeline,
) -> Result<TranslationStats> {
    let mut deck = Deck::open(input).map_err(|e| {
        log::error!("Error loading presentation: {}", e);
        e
    })?;

    let stats = pipeline.run(&mut deck).await;

    deck.save(output)?;
    log::info!("Translated presentation saved to {}", output.display());
    Ok(stats)
}

/// Targets of the relationships listed by `list_item` elements (`p:sldId`, ...)
/// in document order.
///
/// Parts without an id list fall back to every relationship of `rel_type`,
/// ordered by the number in the target name.
fn ordered_targets(
    package: &Package,
    part: &XmlPart,
    list_item: &[u8],
    rel_type: &str,
) -> Result<Vec<String>> {
    let rels = package.relationships(part.name())?;
    let ids = listed_rel_ids(part, list_item)?;

    let mut targets: Vec<String> = ids
        .iter()
        .filter_map(|id| {
            rels.iter()
                .find(|rel| &rel.id == id && rel.rel_type == rel_type && !rel.external)
        })
        .map(|rel| rel.target.clone())
        .collect();

    if targets.is_empty() {
        targets = rels
            .iter()
            .filter(|rel| rel.rel_type == rel_type && !rel.external)
            .map(|rel| rel.target.clone())
            .collect();
        targets.sort_by(|a, b| compare_part_names(a, b));
    }

    Ok(targets)
}

fn listed_rel_ids(part: &XmlPart, list_item: &[u8]) -> Result<Vec<String>> {
    let mut cursor = part.cursor();
    let mut ids = Vec::new();
    loop {
        match cursor.next()?.1 {
            Event::Empty(ref e) | Event::Start(ref e)
                if local_name(e.name().as_ref()) == list_item =>
            {
                if let Some(id) = attribute(e, b"id", true) {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

fn compare_part_names(a: &str, b: &str) -> Ordering {
    match (extract_part_number(a), extract_part_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Extract the trailing number from a name like "slide3.xml" or "slideLayout12.xml".
fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
