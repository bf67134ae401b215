//! Recognizing PresentationML packages.

use crate::container::Package;
use crate::error::{Error, Result};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Main part content types, most specific first.
const MAIN_CONTENT_TYPES: [(&str, PresentationFormat); 4] = [
    (
        "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml",
        PresentationFormat::MacroEnabled,
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml",
        PresentationFormat::Template,
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml",
        PresentationFormat::Slideshow,
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        PresentationFormat::Presentation,
    ),
];

/// Flavor of PresentationML package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationFormat {
    /// Regular presentation (.pptx)
    Presentation,
    /// Macro-enabled presentation (.pptm)
    MacroEnabled,
    /// Template (.potx)
    Template,
    /// Slideshow (.ppsx)
    Slideshow,
}

impl PresentationFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            PresentationFormat::Presentation => "pptx",
            PresentationFormat::MacroEnabled => "pptm",
            PresentationFormat::Template => "potx",
            PresentationFormat::Slideshow => "ppsx",
        }
    }
}

impl std::fmt::Display for PresentationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PresentationFormat::Presentation => "PowerPoint Presentation",
            PresentationFormat::MacroEnabled => "PowerPoint Macro-Enabled Presentation",
            PresentationFormat::Template => "PowerPoint Template",
            PresentationFormat::Slideshow => "PowerPoint Slideshow",
        };
        f.write_str(name)
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Determine the presentation flavor of an opened package.
///
/// Falls back to the folder layout when `[Content_Types].xml` lists no
/// known main part.
pub fn detect_format(package: &Package) -> Result<PresentationFormat> {
    let content_types = package.read_xml("[Content_Types].xml")?;

    if let Some((_, format)) = MAIN_CONTENT_TYPES
        .iter()
        .find(|(ct, _)| content_types.contains(ct))
    {
        return Ok(*format);
    }

    if package.exists("ppt/presentation.xml") {
        Ok(PresentationFormat::Presentation)
    } else {
        Err(Error::InvalidData(
            "package does not contain a PresentationML main part".to_string(),
        ))
    }
}
