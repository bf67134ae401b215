//! PowerPoint package reading and writing.
//!
//! Loading turns `ppt/presentation.xml`, its slides, layouts and masters into
//! a [`Presentation`]. Shapes keep the XML they were read from so saving
//! reproduces them unchanged; only slides whose shape list changed are
//! rebuilt.

mod parser;
pub(crate) mod template;
pub(crate) mod writer;

pub(crate) use parser::{parse_common_slide_name, parse_shape, split_sp_tree};

use crate::container::{
    Package, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER,
};
use crate::detect::{detect_format, is_zip_file};
use crate::error::{Error, Result};
use crate::model::{Layout, PlaceholderType, Presentation, Shape, ShapeKind, Slide};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEFAULT_MAIN_PART: &str = "ppt/presentation.xml";

impl Presentation {
    /// Open a `.pptx` file.
    ///
    /// Every failure (missing file, not a ZIP, not a presentation, broken
    /// XML) is reported as [`Error::Load`] naming the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |reason: String| Error::Load {
            path: path.to_path_buf(),
            reason,
        };

        let data = fs::read(path).map_err(|e| load_err(e.to_string()))?;
        if !is_zip_file(&data) {
            return Err(load_err("not a ZIP package".to_string()));
        }
        let package = Package::from_bytes(&data).map_err(|e| load_err(e.to_string()))?;
        Self::from_package(package, Some(path.to_path_buf()))
            .map_err(|e| load_err(e.to_string()))
    }

    /// Load a presentation from in-memory ZIP bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        Self::from_package(package, None)
    }

    /// A new, empty 16:9 presentation built from the bundled blank template.
    pub fn new_blank() -> Result<Self> {
        Self::from_package(template::blank_package(), None)
    }

    pub(crate) fn from_package(package: Package, path: Option<PathBuf>) -> Result<Self> {
        let format = detect_format(&package)?;
        debug!(%format, parts = package.part_names().count(), "loading package");

        let main_part = find_main_part(&package)?;
        let info = parser::parse_presentation_xml(&package.read_xml(&main_part)?)?;
        let rels = package.read_relationships(&main_part)?;

        let layouts = load_layouts(&package, &main_part)?;

        let mut slides = Vec::with_capacity(info.slides.len());
        let mut slide_ids = Vec::with_capacity(info.slides.len());
        for (slide_id, rel_id) in &info.slides {
            let Some(rel) = rels.get(rel_id).filter(|r| r.rel_type == REL_SLIDE) else {
                warn!(rel_id = %rel_id, "slide relationship missing, skipping");
                continue;
            };
            let part_name = Package::resolve_path(&main_part, &rel.target);
            slides.push(load_slide(&package, &part_name, &layouts)?);
            slide_ids.push(*slide_id);
        }

        Ok(Presentation {
            package,
            path,
            main_part,
            slide_width: info.slide_width,
            slide_height: info.slide_height,
            slides,
            slide_ids,
            layouts,
        })
    }
}

fn find_main_part(package: &Package) -> Result<String> {
    let root = package.read_relationships("")?;
    let main = root
        .first_of_type(REL_OFFICE_DOCUMENT)
        .filter(|r| !r.external)
        .map(|r| r.target.trim_start_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

    if !package.exists(&main) {
        return Err(Error::MissingComponent(main));
    }
    Ok(main)
}

/// Placeholders of a layout or master part.
fn load_placeholders(package: &Package, part_name: &str) -> Result<Vec<Shape>> {
    let xml = package.read_xml(part_name)?;
    let tree = split_sp_tree(&xml)?;
    Ok(tree
        .fragments
        .iter()
        .map(|f| parse_shape(f))
        .filter(|s| matches!(s.kind, ShapeKind::Placeholder { .. }))
        .collect())
}

/// All layouts of all masters, in master order. Layout placeholders without
/// a position take it from their master.
fn load_layouts(package: &Package, main_part: &str) -> Result<Vec<Layout>> {
    let rels = package.read_relationships(main_part)?;
    let mut layouts = Vec::new();

    for master_rel in rels.get_by_type(REL_SLIDE_MASTER) {
        let master_part = Package::resolve_path(main_part, &master_rel.target);
        let master_placeholders = load_placeholders(package, &master_part)?;
        let master_rels = package.read_relationships(&master_part)?;

        for layout_rel in master_rels.get_by_type(REL_SLIDE_LAYOUT) {
            let part_name = Package::resolve_path(&master_part, &layout_rel.target);
            let xml = package.read_xml(&part_name)?;
            let name = parse_common_slide_name(&xml)
                .unwrap_or_else(|| format!("Layout {}", layouts.len() + 1));

            let mut placeholders = load_placeholders(package, &part_name)?;
            for ph in placeholders.iter_mut() {
                inherit_from_master(ph, &master_placeholders);
            }

            layouts.push(Layout {
                name,
                part_name,
                placeholders,
            });
        }
    }

    Ok(layouts)
}

fn load_slide(package: &Package, part_name: &str, layouts: &[Layout]) -> Result<Slide> {
    let xml = package.read_xml(part_name)?;
    let tree = split_sp_tree(&xml)?;
    let mut shapes: Vec<Shape> = tree.fragments.iter().map(|f| parse_shape(f)).collect();

    let layout = package
        .read_relationships(part_name)?
        .first_of_type(REL_SLIDE_LAYOUT)
        .map(|r| Package::resolve_path(part_name, &r.target))
        .and_then(|layout_part| layouts.iter().find(|l| l.part_name == layout_part));

    if let Some(layout) = layout {
        for shape in shapes.iter_mut() {
            inherit_from_layout(shape, &layout.placeholders);
        }
    }

    Ok(Slide {
        layout_name: layout.map(|l| l.name.clone()),
        shapes,
        part_name: part_name.to_string(),
        head: tree.head,
        tail: tree.tail,
        header_max_id: tree.header_max_id,
        dirty: false,
    })
}

/// Fill in a slide placeholder's missing position from the layout
/// placeholder with the same `idx`, or failing that the same type.
pub(crate) fn inherit_from_layout(shape: &mut Shape, layout_placeholders: &[Shape]) {
    if shape.geometry.is_some() {
        return;
    }
    let ShapeKind::Placeholder { ph_type, idx } = &shape.kind else {
        return;
    };

    let by_idx = idx.and_then(|idx| {
        layout_placeholders.iter().find(
            |l| matches!(&l.kind, ShapeKind::Placeholder { idx: Some(other), .. } if *other == idx),
        )
    });
    let source = by_idx.or_else(|| {
        layout_placeholders
            .iter()
            .find(|l| l.placeholder_type() == Some(ph_type))
    });

    if let Some(geometry) = source.and_then(|s| s.geometry) {
        shape.geometry = Some(geometry);
        shape.geometry_inherited = true;
    }
}

fn inherit_from_master(shape: &mut Shape, master_placeholders: &[Shape]) {
    if shape.geometry.is_some() {
        return;
    }
    let Some(wanted) = shape.placeholder_type().map(PlaceholderType::master_type) else {
        return;
    };
    let source = master_placeholders
        .iter()
        .find(|m| m.placeholder_type().map(PlaceholderType::master_type).as_ref() == Some(&wanted));

    if let Some(geometry) = source.and_then(|s| s.geometry) {
        shape.geometry = Some(geometry);
        shape.geometry_inherited = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Emu, Rect};

    #[test]
    fn test_blank_template_loads() {
        let prs = Presentation::new_blank().unwrap();
        assert_eq!(prs.slide_count(), 0);
        assert_eq!(prs.slide_width(), Emu(12_192_000));
        assert_eq!(prs.slide_height(), Emu(6_858_000));

        let names: Vec<&str> = prs.layouts().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Title Slide", "Title and Content", "Title Only", "Blank"]
        );
    }

    #[test]
    fn test_layout_placeholders_inherit_master_geometry() {
        let prs = Presentation::new_blank().unwrap();
        let layout = prs.layout("title only").unwrap();
        let title = layout.placeholders().iter().find(|p| p.is_title()).unwrap();
        assert_eq!(
            title.geometry,
            Some(Rect::new(
                Emu(838_200),
                Emu(365_125),
                Emu(10_515_600),
                Emu(1_325_563)
            ))
        );
        assert!(title.geometry_inherited);
    }

    #[test]
    fn test_open_missing_file_is_load_error() {
        let err = Presentation::open("/nonexistent/deck.pptx").unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_open_non_zip_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pptx");
        fs::write(&path, b"plain text").unwrap();
        let err = Presentation::open(&path).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
