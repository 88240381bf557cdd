//! OPC package handling: the ZIP container shared by PPTX and DOCX files.
//!
//! Every entry is kept in its original order and with its original compression
//! so that a saved package differs from its source only in re-rendered parts.

use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use quick_xml::events::Event;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::xml::{attribute, local_name, XmlCursor, XmlPart};

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An unpacked OOXML package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

/// One `Relationship` element of a `.rels` part, with its target resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Package path of the target part; the raw target for external links.
    pub target: String,
    pub external: bool,
}

impl Package {
    /// Open and unpack a package file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(std::io::Cursor::new(bytes))
    }

    /// Get a part's contents by path.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| !entry.is_dir && entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| entry.name.as_str())
    }

    /// Read a required XML part.
    pub fn read_part(&self, name: &str) -> Result<XmlPart> {
        let bytes = self
            .get(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let xml = String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::InvalidDocument(format!("{} is not UTF-8 XML", name)))?;
        Ok(XmlPart::new(name, xml))
    }

    /// Set or replace a part's contents. New parts are deflated.
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    /// Relationships declared by `part`; empty when it has no `.rels` part.
    ///
    /// Pass `""` for the package-level relationships in `_rels/.rels`.
    pub fn relationships(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels_path = rels_path_for(part);
        if !self.contains(&rels_path) {
            return Ok(Vec::new());
        }
        let rels = self.read_part(&rels_path)?;
        parse_relationships(part, &rels)
    }

    /// Target of the first relationship of `rel_type` declared by `part`.
    pub fn related_part(&self, part: &str, rel_type: &str) -> Result<Option<String>> {
        Ok(self
            .relationships(part)?
            .into_iter()
            .find(|rel| !rel.external && rel.rel_type == rel_type)
            .map(|rel| rel.target))
    }

    /// Write every entry to `writer`, keeping order and compression.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Save to `path` atomically: a failed save leaves no partial file behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        self.write_to(temp.as_file_mut())?;
        temp.as_file_mut().flush()?;
        temp.persist(path).map_err(|e| Error::IoError(e.error))?;
        Ok(())
    }
}

/// Path of the relationships part for `part`, e.g. `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the part that declares it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(Vec::new(), absolute);
    }

    let base = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    normalize(base, target)
}

fn normalize<'a>(mut segments: Vec<&'a str>, relative: &'a str) -> String {
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parse_relationships(source_part: &str, rels: &XmlPart) -> Result<Vec<Relationship>> {
    let mut cursor = rels.cursor();
    let mut relationships = Vec::new();

    loop {
        match cursor.next()?.1 {
            Event::Empty(ref e) | Event::Start(ref e)
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let id = attribute(e, b"Id", false).unwrap_or_default();
                let rel_type = attribute(e, b"Type", false).unwrap_or_default();
                let raw_target = attribute(e, b"Target", false).unwrap_or_default();
                let external = attribute(e, b"TargetMode", false)
                    .map(|mode| mode.eq_ignore_ascii_case("External"))
                    .unwrap_or(false);

                let target = if external {
                    raw_target
                } else {
                    resolve_target(source_part, &raw_target)
                };
                relationships.push(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::build_package;
    use std::io::Cursor;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(rels_path_for(""), "_rels/.rels");
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../charts/chart1.xml"),
            "ppt/charts/chart1.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "./../slideLayouts/./slideLayout1.xml"),
            "ppt/slideLayouts/slideLayout1.xml"
        );
    }

    #[test]
    fn test_relationships_parsed_and_resolved() {
        let bytes = build_package(&[
            ("ppt/slides/slide1.xml", "<p:sld/>"),
            (
                "ppt/slides/_rels/slide1.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#,
            ),
        ]);
        let package = Package::from_bytes(&bytes).unwrap();
        let rels = package.relationships("ppt/slides/slide1.xml").unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[0].target, "ppt/charts/chart1.xml");
        assert!(!rels[0].external);
        assert_eq!(rels[1].target, "https://example.com");
        assert!(rels[1].external);

        assert!(package.relationships("ppt/slides/slide2.xml").unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_order_and_content() {
        let bytes = build_package(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", "<w:document/>"),
            ("word/media/image1.png", "binary"),
        ]);
        let mut package = Package::from_bytes(&bytes).unwrap();
        package.set("word/document.xml", b"<w:document>changed</w:document>".to_vec());

        let mut buffer = Cursor::new(Vec::new());
        package.write_to(&mut buffer).unwrap();
        let restored = Package::from_bytes(buffer.get_ref()).unwrap();

        let names: Vec<&str> = restored.part_names().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "word/document.xml", "word/media/image1.png"]
        );
        assert_eq!(
            restored.get("word/document.xml"),
            Some(&b"<w:document>changed</w:document>"[..])
        );
        assert_eq!(restored.get("word/media/image1.png"), Some(&b"binary"[..]));
    }

    #[test]
    fn test_missing_part_and_bad_zip() {
        let package = Package::from_bytes(&build_package(&[("a.xml", "<a/>")])).unwrap();
        assert!(matches!(
            package.read_part("b.xml"),
            Err(Error::MissingPart(name)) if name == "b.xml"
        ));

        assert!(matches!(
            Package::from_bytes(b"definitely not a zip"),
            Err(Error::ZipError(_))
        ));
    }

    #[test]
    fn test_save_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let package = Package::from_bytes(&build_package(&[("a.xml", "<a/>")])).unwrap();

        package.save(&path).unwrap();

        let reopened = Package::open(&path).unwrap();
        assert_eq!(reopened.get("a.xml"), Some(&b"<a/>"[..]));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
