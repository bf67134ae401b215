//! ZIP package abstraction for PresentationML files.
//!
//! Unlike a read-only container, a [`Package`] keeps every part in memory so
//! that edited parts can be swapped in and the whole archive written back.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Relationship type URI for the main document part.
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type URI for slides.
pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Relationship type URI for slide layouts.
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

/// Relationship type URI for slide masters.
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

const CONTENT_TYPES: &str = "[Content_Types].xml";

/// A relationship entry from a .rels part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path, relative to the source part's directory
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Relationships of one source part, in document order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of a .rels part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Relationships::new();
        if xml.trim().is_empty() {
            return Ok(rels);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e))
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }
                    if !rel.id.is_empty() {
                        rels.entries.push(rel);
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.rel_type == rel_type)
    }

    /// All relationships of the given type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.entries
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest `rIdN` not already in use.
    pub fn next_id(&self) -> String {
        let max = self
            .entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Append a relationship and return its id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Serialize back to a .rels part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for rel in &self.entries {
            xml.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
                escape_attr(&rel.id),
                escape_attr(&rel.rel_type),
                escape_attr(&rel.target),
                if rel.external {
                    " TargetMode=\"External\""
                } else {
                    ""
                }
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Decode part bytes to a string, honoring UTF-8 and UTF-16 byte order marks.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec())
            .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {}", e))),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    let content = char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::InvalidData(format!("invalid UTF-16: {}", e)))?;
    // The declaration still names UTF-16, which would confuse the XML reader.
    Ok(content
        .replacen("encoding=\"UTF-16\"", "encoding=\"UTF-8\"", 1)
        .replacen("encoding=\"utf-16\"", "encoding=\"UTF-8\"", 1))
}

/// Escape a value for use inside a double-quoted XML attribute.
pub fn escape_attr(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

struct Part {
    name: String,
    data: Vec<u8>,
}

/// An OOXML package held entirely in memory.
pub struct Package {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl Package {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Read every part of a ZIP archive into memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut package = Self::empty();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            package.put_part(&name, bytes);
        }

        Ok(package)
    }

    /// A package with no parts.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Read an XML part as a string.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        decode_xml_bytes(self.read_binary(name)?)
    }

    /// Read a part's raw bytes.
    pub fn read_binary(&self, name: &str) -> Result<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.parts[i].data.as_slice())
            .ok_or_else(|| Error::MissingComponent(name.to_string()))
    }

    /// Check if a part exists.
    pub fn exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Replace a part's content, or append it if it does not exist yet.
    pub fn put_part(&mut self, name: &str, data: Vec<u8>) {
        match self.index.get(name) {
            Some(&i) => self.parts[i].data = data,
            None => {
                self.index.insert(name.to_string(), self.parts.len());
                self.parts.push(Part {
                    name: name.to_string(),
                    data,
                });
            }
        }
    }

    /// Read the relationships of a part; a missing .rels part yields none.
    pub fn read_relationships(&self, part_name: &str) -> Result<Relationships> {
        match self.read_xml(&Self::rels_path(part_name)) {
            Ok(xml) => Relationships::parse(&xml),
            Err(Error::MissingComponent(_)) => Ok(Relationships::new()),
            Err(e) => Err(e),
        }
    }

    /// Store the relationships of a part.
    pub fn write_relationships(&mut self, part_name: &str, rels: &Relationships) {
        self.put_part(&Self::rels_path(part_name), rels.to_xml().into_bytes());
    }

    /// Register a content type override for a new part.
    pub fn add_content_type_override(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let xml = self.read_xml(CONTENT_TYPES)?;
        let part_attr = format!("PartName=\"/{}\"", part_name);
        if xml.contains(&part_attr) {
            return Ok(());
        }
        let end = xml
            .rfind("</Types>")
            .ok_or_else(|| Error::InvalidData("content types part has no </Types>".into()))?;
        let updated = format!(
            "{}<Override {} ContentType=\"{}\"/>{}",
            &xml[..end],
            part_attr,
            content_type,
            &xml[end..]
        );
        self.put_part(CONTENT_TYPES, updated.into_bytes());
        Ok(())
    }

    /// Serialize the package to ZIP bytes. The content types part goes first.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let ordered = self
            .parts
            .iter()
            .filter(|p| p.name == CONTENT_TYPES)
            .chain(self.parts.iter().filter(|p| p.name != CONTENT_TYPES));
        for part in ordered {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Path of the .rels part belonging to `part_name`.
    ///
    /// `ppt/slides/slide1.xml` maps to `ppt/slides/_rels/slide1.xml.rels`.
    pub fn rels_path(part_name: &str) -> String {
        match part_name.rfind('/') {
            Some(slash) => format!(
                "{}/_rels/{}.rels",
                &part_name[..slash],
                &part_name[slash + 1..]
            ),
            None if part_name.is_empty() => "_rels/.rels".to_string(),
            None => format!("_rels/{}.rels", part_name),
        }
    }

    /// Resolve a relationship target against the part that references it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut segments: Vec<&str> = base.split('/').collect();
        segments.pop();
        for segment in relative.split('/') {
            match segment {
                ".." => {
                    segments.pop();
                }
                "." | "" => {}
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    /// Express `target` relative to the directory of `base`.
    pub fn relative_path(base: &str, target: &str) -> String {
        let base_dir: Vec<&str> = {
            let mut s: Vec<&str> = base.split('/').collect();
            s.pop();
            s
        };
        let target_segments: Vec<&str> = target.split('/').collect();
        let common = base_dir
            .iter()
            .zip(target_segments.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = std::iter::repeat("..").take(base_dir.len() - common).collect();
        parts.extend_from_slice(&target_segments[common..]);
        parts.join("/")
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.parts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            Package::resolve_path("ppt/slides/slide1.xml", "../slideLayouts/slideLayout1.xml"),
            "ppt/slideLayouts/slideLayout1.xml"
        );
        assert_eq!(
            Package::resolve_path("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            Package::resolve_path("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            Package::relative_path("ppt/slides/slide1.xml", "ppt/slideLayouts/slideLayout1.xml"),
            "../slideLayouts/slideLayout1.xml"
        );
        assert_eq!(
            Package::relative_path("ppt/presentation.xml", "ppt/slides/slide3.xml"),
            "slides/slide3.xml"
        );
    }

    #[test]
    fn test_rels_path() {
        assert_eq!(
            Package::rels_path("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(Package::rels_path(""), "_rels/.rels");
    }

    #[test]
    fn test_relationships_roundtrip() {
        let mut rels = Relationships::new();
        let first = rels.add(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let second = rels.add(REL_SLIDE, "slides/slide1.xml");
        assert_eq!(first, "rId1");
        assert_eq!(second, "rId2");

        let parsed = Relationships::parse(&rels.to_xml()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.first_of_type(REL_SLIDE).map(|r| r.target.as_str()),
            Some("slides/slide1.xml")
        );
        assert_eq!(parsed.next_id(), "rId3");
    }

    #[test]
    fn test_utf16_decoding() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");
    }

    #[test]
    fn test_package_roundtrip() {
        let mut package = Package::empty();
        package.put_part("[Content_Types].xml", b"<Types></Types>".to_vec());
        package.put_part("ppt/presentation.xml", b"<p:presentation/>".to_vec());
        package
            .add_content_type_override("ppt/slides/slide1.xml", "application/test")
            .unwrap();

        let bytes = package.to_bytes().unwrap();
        let reopened = Package::from_bytes(&bytes).unwrap();
        assert!(reopened.exists("ppt/presentation.xml"));
        let types = reopened.read_xml("[Content_Types].xml").unwrap();
        assert!(types.contains("PartName=\"/ppt/slides/slide1.xml\""));
        assert!(matches!(
            reopened.read_xml("missing.xml"),
            Err(Error::MissingComponent(_))
        ));
    }
}
