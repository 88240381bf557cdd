//! Position-tracking XML reading and in-place text splicing for package parts.
//!
//! Parts are never re-serialized from a parsed model. Parsers record the byte
//! range of every text element they turn into a [`Run`], and [`XmlPart::render`]
//! copies the original source, replacing only the content of runs whose text
//! changed.

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::types::Run;

/// Attribute inserted into word-processing text elements that gain edge whitespace.
const PRESERVE_SPACE_ATTR: &str = " xml:space=\"preserve\"";

/// Characters standing in for `w:tab` and `w:br`/`w:cr` in run text.
const SEGMENT_BREAKS: [char; 2] = ['\t', '\n'];

/// Location of one text element inside its part's XML source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Byte range of the element content, between the start and end tags.
    pub content: Range<usize>,
    /// Where `xml:space="preserve"` goes if the element needs it and lacks it.
    pub space_attr_at: Option<usize>,
    /// Index of the tab- or break-separated piece of the run text this element holds.
    pub segment: usize,
}

/// An XML part of a package together with its original source.
#[derive(Debug, Clone)]
pub struct XmlPart {
    name: String,
    xml: String,
}

impl XmlPart {
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }

    /// Package path of this part, e.g. `ppt/slides/slide1.xml`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a cursor over the original source.
    pub fn cursor(&self) -> XmlCursor<'_> {
        XmlCursor::new(&self.name, &self.xml)
    }

    /// Render the part with the current text of `runs` spliced in.
    ///
    /// Only runs whose text differs from the parsed text produce edits, so a
    /// part without modified runs renders byte-identical to its source.
    ///
    /// When the new text keeps the run's tabs and breaks, each piece between
    /// them goes back into the text elements it came from. Otherwise the whole
    /// text lands in the first element and the others are emptied.
    pub fn render<'r>(&self, runs: impl IntoIterator<Item = &'r Run>) -> String {
        let mut edits: Vec<(Range<usize>, Cow<'r, str>)> = Vec::new();

        for run in runs.into_iter().filter(|run| run.is_modified()) {
            let text = run.text();
            let spans = run.spans();
            let segments = split_segments(run);
            for (idx, span) in spans.iter().enumerate() {
                let piece = match &segments {
                    Some(segments) if idx == 0 || spans[idx - 1].segment != span.segment => {
                        segments[span.segment]
                    }
                    None if idx == 0 => text,
                    _ => "",
                };
                if let Some(at) = span.space_attr_at.filter(|_| has_edge_whitespace(piece)) {
                    edits.push((at..at, Cow::Borrowed(PRESERVE_SPACE_ATTR)));
                }
                edits.push((span.content.clone(), partial_escape(piece)));
            }
        }

        if edits.is_empty() {
            return self.xml.clone();
        }

        edits.sort_by_key(|(range, _)| (range.start, range.end));

        let mut out = String::with_capacity(self.xml.len() + edits.len() * 16);
        let mut cursor = 0;
        for (range, replacement) in edits {
            out.push_str(&self.xml[cursor..range.start]);
            out.push_str(&replacement);
            cursor = range.end;
        }
        out.push_str(&self.xml[cursor..]);
        out
    }
}

/// Pieces of the run text between its tabs and breaks, if they can be put back
/// one piece per element group.
///
/// Fails when the breaks differ from the parsed ones, or when a non-empty
/// piece has no text element to hold it.
fn split_segments(run: &Run) -> Option<Vec<&str>> {
    let breaks = |text: &str| {
        text.chars()
            .filter(|c| SEGMENT_BREAKS.contains(c))
            .collect::<Vec<_>>()
    };
    if breaks(run.text()) != breaks(run.original_text()) {
        return None;
    }

    let segments: Vec<&str> = run.text().split(&SEGMENT_BREAKS[..]).collect();
    let placed = segments.iter().enumerate().all(|(idx, segment)| {
        segment.is_empty() || run.spans().iter().any(|span| span.segment == idx)
    });
    let in_range = run.spans().iter().all(|span| span.segment < segments.len());
    (placed && in_range).then_some(segments)
}

/// Whether the text would lose leading or trailing whitespace without `xml:space`.
fn has_edge_whitespace(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Look up an attribute by its local name.
///
/// With `prefixed` set, only namespaced attributes match (`r:id` but not `id`).
pub fn attribute(element: &BytesStart<'_>, local: &[u8], prefixed: bool) -> Option<String> {
    element.attributes().flatten().find_map(|attr| {
        let key = attr.key.as_ref();
        let has_prefix = key.contains(&b':');
        if local_name(key) == local && has_prefix == prefixed {
            Some(String::from_utf8_lossy(&attr.value).into_owned())
        } else {
            None
        }
    })
}

/// A direct child element met while walking an element's content.
pub struct Child<'a> {
    /// Offset of the child's start tag.
    pub at: usize,
    pub element: BytesStart<'a>,
    /// Self-closing (`<a:t/>`) children have no content to consume.
    pub empty: bool,
}

impl<'a> Child<'a> {
    pub fn local_name(&self) -> &[u8] {
        local_name(self.element.name().into_inner())
    }
}

/// Streaming reader that reports the byte offset of every event.
pub struct XmlCursor<'a> {
    part: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> XmlCursor<'a> {
    pub fn new(part: &'a str, xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);
        Self { part, reader }
    }

    /// Byte offset just past the last event read.
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Read the next event together with the offset it starts at.
    pub fn next(&mut self) -> Result<(usize, Event<'a>)> {
        let start = self.position();
        let event = self
            .reader
            .read_event()
            .map_err(|e| Error::xml(self.part, e))?;
        Ok((start, event))
    }

    /// Consume events up to and including the end tag of the element just opened.
    pub fn skip_element(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.next()?.1 {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Walk the direct children of the element just opened, through its end tag.
    ///
    /// `visit` returns `true` when it consumed a non-empty child itself;
    /// otherwise the child is skipped.
    pub fn children<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Self, Child<'a>) -> Result<bool>,
    {
        loop {
            let (at, event) = self.next()?;
            match event {
                Event::Start(element) => {
                    let child = Child {
                        at,
                        element,
                        empty: false,
                    };
                    if !visit(self, child)? {
                        self.skip_element()?;
                    }
                }
                Event::Empty(element) => {
                    visit(
                        self,
                        Child {
                            at,
                            element,
                            empty: true,
                        },
                    )?;
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Hand the content of the first non-empty child named `local` to `inner`,
    /// then finish the current element.
    pub fn enter<F>(&mut self, local: &[u8], mut inner: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        let mut entered = false;
        self.children(|cursor, child| {
            if entered || child.empty || child.local_name() != local {
                return Ok(false);
            }
            entered = true;
            inner(cursor)?;
            Ok(true)
        })
    }

    /// Advance to the first start element with the given local name.
    ///
    /// Returns `false` if the document ends first.
    pub fn seek(&mut self, local: &[u8]) -> Result<bool> {
        loop {
            match self.next()?.1 {
                Event::Start(ref e) if local_name(e.name().as_ref()) == local => return Ok(true),
                Event::Eof => return Ok(false),
                _ => {}
            }
        }
    }

    /// Read the content of a text element whose start tag began at `tag_start`.
    ///
    /// Set `space_aware` for elements that honour `xml:space`, so the renderer
    /// can add the attribute when translated text needs it.
    pub fn read_text(
        &mut self,
        tag_start: usize,
        element: &BytesStart<'_>,
        space_aware: bool,
    ) -> Result<(String, TextSpan)> {
        let preserves = element
            .attributes()
            .flatten()
            .any(|attr| attr.key.as_ref() == b"xml:space" && attr.value.as_ref() == b"preserve");
        let space_attr_at = (space_aware && !preserves)
            .then(|| tag_start + 1 + element.name().as_ref().len());

        let content_start = self.position();
        let mut text = String::new();
        loop {
            let (at, event) = self.next()?;
            match event {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| Error::xml(self.part, e))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Start(_) => self.skip_element()?,
                Event::End(_) => {
                    let span = TextSpan {
                        content: content_start..at,
                        space_attr_at,
                        segment: 0,
                    };
                    return Ok((text, span));
                }
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    fn unexpected_eof(&self) -> Error {
        Error::xml(self.part, "unexpected end of document")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_text(xml: &str, space_aware: bool) -> (String, TextSpan) {
        let mut cursor = XmlCursor::new("test.xml", xml);
        loop {
            let (at, event) = cursor.next().unwrap();
            if let Event::Start(e) = event {
                if local_name(e.name().as_ref()) == b"t" {
                    return cursor.read_text(at, &e, space_aware).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_read_text_span_covers_raw_content() {
        let xml = r#"<a:p><a:r><a:t>Fish &amp; Chips</a:t></a:r></a:p>"#;
        let (text, span) = first_text(xml, false);

        assert_eq!(text, "Fish & Chips");
        assert_eq!(&xml[span.content.clone()], "Fish &amp; Chips");
        assert_eq!(span.space_attr_at, None);
    }

    #[test]
    fn test_space_attr_position_only_when_missing() {
        let xml = r#"<w:r><w:t>Hi</w:t></w:r>"#;
        let (_, span) = first_text(xml, true);
        assert_eq!(&xml[..span.space_attr_at.unwrap()], "<w:r><w:t");

        let xml = r#"<w:r><w:t xml:space="preserve"> Hi</w:t></w:r>"#;
        let (text, span) = first_text(xml, true);
        assert_eq!(text, " Hi");
        assert_eq!(span.space_attr_at, None);
    }

    #[test]
    fn test_render_without_changes_is_identical() {
        let xml = r#"<a:p><a:r><a:t>Hello</a:t></a:r></a:p>"#;
        let (text, span) = first_text(xml, false);
        let run = Run::new(text, vec![span]);
        let part = XmlPart::new("test.xml", xml);

        assert_eq!(part.render([&run]), xml);
    }

    #[test]
    fn test_render_escapes_and_splices() {
        let xml = r#"<a:p><a:r><a:rPr b="1"/><a:t>Hello</a:t></a:r></a:p>"#;
        let (text, span) = first_text(xml, false);
        let mut run = Run::new(text, vec![span]);
        run.set_text("<Bonjour & salut>");
        let part = XmlPart::new("test.xml", xml);

        assert_eq!(
            part.render([&run]),
            r#"<a:p><a:r><a:rPr b="1"/><a:t>&lt;Bonjour &amp; salut&gt;</a:t></a:r></a:p>"#
        );
    }

    #[test]
    fn test_render_adds_preserve_for_edge_whitespace() {
        let xml = r#"<w:r><w:t>Hello</w:t></w:r>"#;
        let (text, span) = first_text(xml, true);
        let mut run = Run::new(text, vec![span]);
        run.set_text("Hola ");
        let part = XmlPart::new("test.xml", xml);

        assert_eq!(
            part.render([&run]),
            r#"<w:r><w:t xml:space="preserve">Hola </w:t></w:r>"#
        );
    }

    /// Text and spans of every `t` element, with tabs and breaks as separators.
    fn run_of(xml: &str) -> Run {
        let mut cursor = XmlCursor::new("test.xml", xml);
        let mut text = String::new();
        let mut spans = Vec::new();
        let mut segment = 0;
        loop {
            let (at, event) = cursor.next().unwrap();
            match event {
                Event::Start(e) if local_name(e.name().as_ref()) == b"t" => {
                    let (chunk, mut span) = cursor.read_text(at, &e, true).unwrap();
                    span.segment = segment;
                    text.push_str(&chunk);
                    spans.push(span);
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"tab" => {
                    text.push('\t');
                    segment += 1;
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"br" => {
                    text.push('\n');
                    segment += 1;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Run::new(text, spans)
    }

    #[test]
    fn test_render_empties_trailing_spans_of_a_piece() {
        let xml = r#"<w:r><w:t>Hel</w:t><w:t>lo</w:t></w:r>"#;
        let mut run = run_of(xml);
        assert_eq!(run.text(), "Hello");

        run.set_text("Hola");
        let part = XmlPart::new("test.xml", xml);
        assert_eq!(
            part.render([&run]),
            r#"<w:r><w:t>Hola</w:t><w:t></w:t></w:r>"#
        );
    }

    #[test]
    fn test_render_keeps_tabs_and_breaks_between_pieces() {
        let xml = r#"<w:r><w:t>Hello</w:t><w:tab/><w:t>World</w:t><w:br/><w:t>again</w:t></w:r>"#;
        let mut run = run_of(xml);
        assert_eq!(run.text(), "Hello\tWorld\nagain");

        run.set_text("Hola\tMundo \notra vez");
        let part = XmlPart::new("test.xml", xml);
        assert_eq!(
            part.render([&run]),
            r#"<w:r><w:t>Hola</w:t><w:tab/><w:t xml:space="preserve">Mundo </w:t><w:br/><w:t>otra vez</w:t></w:r>"#
        );
    }

    #[test]
    fn test_render_falls_back_to_first_span_when_breaks_change() {
        let xml = r#"<w:r><w:t>Hello</w:t><w:tab/><w:t>World</w:t></w:r>"#;
        let mut run = run_of(xml);

        run.set_text("Hola Mundo");
        let part = XmlPart::new("test.xml", xml);
        assert_eq!(
            part.render([&run]),
            r#"<w:r><w:t>Hola Mundo</w:t><w:tab/><w:t></w:t></w:r>"#
        );
    }

    #[test]
    fn test_render_falls_back_when_a_piece_has_no_element() {
        let xml = r#"<w:r><w:tab/><w:t>World</w:t></w:r>"#;
        let mut run = run_of(xml);
        assert_eq!(run.text(), "\tWorld");

        run.set_text("Hi\tMundo");
        let part = XmlPart::new("test.xml", xml);
        assert_eq!(
            part.render([&run]),
            "<w:r><w:tab/><w:t>Hi\tMundo</w:t></w:r>"
        );

        run.set_text("\tMundo");
        assert_eq!(part.render([&run]), r#"<w:r><w:tab/><w:t>Mundo</w:t></w:r>"#);
    }

    #[test]
    fn test_attribute_prefix_matching() {
        let xml = r#"<p:sldId id="256" r:id="rId2"/>"#;
        let mut cursor = XmlCursor::new("test.xml", xml);
        let (_, event) = cursor.next().unwrap();
        let Event::Empty(e) = event else {
            panic!("expected empty element");
        };
        assert_eq!(attribute(&e, b"id", true).as_deref(), Some("rId2"));
        assert_eq!(attribute(&e, b"id", false).as_deref(), Some("256"));
    }

    #[test]
    fn test_children_visits_direct_children_only() {
        let xml = r#"<root><a><nested/></a><b/><c>text</c></root><after/>"#;
        let mut cursor = XmlCursor::new("test.xml", xml);
        assert!(cursor.seek(b"root").unwrap());

        let mut seen = Vec::new();
        cursor
            .children(|_, child| {
                seen.push((String::from_utf8_lossy(child.local_name()).into_owned(), child.empty));
                Ok(false)
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), false),
                ("b".to_string(), true),
                ("c".to_string(), false)
            ]
        );
        let (_, event) = cursor.next().unwrap();
        assert!(matches!(event, Event::Empty(ref e) if e.name().as_ref() == b"after"));
    }

    #[test]
    fn test_enter_reaches_first_matching_child() {
        let xml = r#"<title><layout/><tx><rich>one</rich></tx><tx><rich>two</rich></tx></title>"#;
        let mut cursor = XmlCursor::new("chart.xml", xml);
        assert!(cursor.seek(b"title").unwrap());

        let mut found = Vec::new();
        cursor
            .enter(b"tx", |cursor| {
                cursor.enter(b"rich", |cursor| {
                    let (_, event) = cursor.next()?;
                    if let Event::Text(text) = event {
                        found.push(text.unescape().unwrap().into_owned());
                    }
                    cursor.skip_element()
                })
            })
            .unwrap();

        assert_eq!(found, vec!["one".to_string()]);
        assert!(matches!(cursor.next().unwrap().1, Event::Eof));
    }

    #[test]
    fn test_skip_element_consumes_nested_content() {
        let xml = r#"<root><skip><a><b/></a></skip><keep/></root>"#;
        let mut cursor = XmlCursor::new("test.xml", xml);
        assert!(cursor.seek(b"skip").unwrap());
        cursor.skip_element().unwrap();
        let (_, event) = cursor.next().unwrap();
        match event {
            Event::Empty(e) => assert_eq!(e.name().as_ref(), b"keep"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
