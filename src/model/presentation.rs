//! Presentation, slide and layout structures.

use super::{Emu, Shape, ShapeId};
use crate::container::Package;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A slide layout, with the placeholders new slides inherit from.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub name: String,
    #[serde(skip)]
    pub(crate) part_name: String,
    #[serde(skip)]
    pub(crate) placeholders: Vec<Shape>,
}

impl Layout {
    pub fn placeholders(&self) -> &[Shape] {
        &self.placeholders
    }
}

/// A slide: an ordered list of shapes, in z-order.
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    pub(crate) layout_name: Option<String>,
    pub(crate) shapes: Vec<Shape>,
    #[serde(skip)]
    pub(crate) part_name: String,
    /// Slide XML up to the first shape of the shape tree
    #[serde(skip)]
    pub(crate) head: String,
    /// Slide XML after the last shape of the shape tree
    #[serde(skip)]
    pub(crate) tail: String,
    /// Highest `cNvPr` id outside the shape list (the tree's own group id)
    #[serde(skip)]
    pub(crate) header_max_id: u32,
    /// Whether the shape list changed since loading
    #[serde(skip)]
    pub(crate) dirty: bool,
}

impl Slide {
    /// Name of the layout the slide is based on.
    pub fn layout_name(&self) -> Option<&str> {
        self.layout_name.as_deref()
    }

    /// Shapes in document order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub(crate) fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// The title placeholder, if the slide has one.
    pub fn title(&self) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.is_title())
    }

    /// Id of the title placeholder, if the slide has one.
    pub fn title_id(&self) -> Option<ShapeId> {
        self.title().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Id for the next shape added to this slide.
    pub(crate) fn next_shape_id(&self) -> ShapeId {
        let max = self
            .shapes
            .iter()
            .map(|s| s.max_nested_id.max(s.id.0))
            .chain(std::iter::once(self.header_max_id))
            .max()
            .unwrap_or(1);
        ShapeId(max + 1)
    }

    /// Keep only the shapes matching `keep`, preserving order.
    pub(crate) fn retain_shapes(&mut self, keep: impl FnMut(&Shape) -> bool) -> usize {
        let before = self.shapes.len();
        self.shapes.retain(keep);
        let removed = before - self.shapes.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub(crate) fn push_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        self.shapes.push(shape);
        self.dirty = true;
        id
    }
}

/// An open presentation.
#[derive(Debug)]
pub struct Presentation {
    pub(crate) package: Package,
    pub(crate) path: Option<PathBuf>,
    /// Main part, normally `ppt/presentation.xml`
    pub(crate) main_part: String,
    pub(crate) slide_width: Emu,
    pub(crate) slide_height: Emu,
    pub(crate) slides: Vec<Slide>,
    /// `p:sldId/@id` values, parallel to `slides`
    pub(crate) slide_ids: Vec<u32>,
    pub(crate) layouts: Vec<Layout>,
}

impl Presentation {
    /// Path the presentation was loaded from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(unsaved)".to_string())
    }

    pub fn slide_width(&self) -> Emu {
        self.slide_width
    }

    pub fn slide_height(&self) -> Emu {
        self.slide_height
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub(crate) fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Find a layout by name, ignoring case.
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }
}
