//! Safe mutation helpers.
//!
//! These are the only operations an edit plan may perform. Each one
//! validates its inputs and reports failures as [`Error`] values; none of
//! them touches the file on disk.

use crate::error::{Error, Result};
use crate::model::{
    ArrowHead, ColorValue, ConnectorEnds, Emu, Fill, Font, LineStyle, Margins, Presentation,
    Rect, RgbColor, Shadow, Shape, ShapeId, ShapeKind, Slide, TextAlignment, TextFrame,
    TextParagraph, VerticalAnchor,
};
use crate::pptx::writer::replace_text;
use std::path::Path;
use tracing::{debug, warn};

/// Font face given to every created text; it carries CJK glyphs.
pub const FONT_FACE: &str = "Microsoft JhengHei";

/// Default fill of rounded text boxes.
pub const DEFAULT_BOX_FILL: RgbColor = RgbColor::new(232, 244, 248);
/// Default text color of rounded text boxes.
pub const DEFAULT_TEXT_COLOR: RgbColor = RgbColor::new(50, 50, 50);
/// Default arrow color.
pub const DEFAULT_ARROW_COLOR: RgbColor = RgbColor::new(70, 70, 70);

const BORDER_COLOR: RgbColor = RgbColor::new(180, 180, 180);
const CORNER_ADJUSTMENT: f64 = 0.15;

/// Open a presentation file.
pub fn load_presentation(path: impl AsRef<Path>) -> Result<Presentation> {
    Presentation::open(path)
}

/// A blank 16:9 presentation with the standard layouts.
pub fn new_presentation() -> Result<Presentation> {
    Presentation::new_blank()
}

fn check_index(prs: &Presentation, index: i64) -> Result<usize> {
    let count = prs.slide_count();
    if index < 0 || index as u64 >= count as u64 {
        return Err(Error::SlideIndexOutOfRange { index, count });
    }
    Ok(index as usize)
}

/// Slide at a 0-based index. Out-of-range indices are an error, never clamped.
pub fn get_slide(prs: &Presentation, index: i64) -> Result<&Slide> {
    let i = check_index(prs, index)?;
    Ok(&prs.slides()[i])
}

/// Mutable variant of [`get_slide`].
pub fn get_slide_mut(prs: &mut Presentation, index: i64) -> Result<&mut Slide> {
    let i = check_index(prs, index)?;
    Ok(&mut prs.slides_mut()[i])
}

/// Remove every shape whose id is not in `keep`. `None` entries are ignored.
///
/// Returns the number of shapes removed.
pub fn delete_shapes_except(slide: &mut Slide, keep: &[Option<ShapeId>]) -> usize {
    let keep: Vec<ShapeId> = keep.iter().flatten().copied().collect();
    let removed = slide.retain_shapes(|s| keep.contains(&s.id));
    debug!(removed, kept = slide.len(), "deleted shapes");
    removed
}

/// Remove every line and connector. Returns the number removed.
pub fn remove_connectors_and_lines(slide: &mut Slide) -> usize {
    let removed = slide.retain_shapes(|s| !s.is_line_like());
    debug!(removed, "removed connectors and lines");
    removed
}

/// Parameters of a rounded text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxSpec {
    pub text: String,
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
    pub fill_color: RgbColor,
    pub text_color: RgbColor,
    /// Points
    pub font_size: f64,
    pub alignment: TextAlignment,
    pub anchor: VerticalAnchor,
}

impl TextBoxSpec {
    pub fn new(text: impl Into<String>, left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            fill_color: DEFAULT_BOX_FILL,
            text_color: DEFAULT_TEXT_COLOR,
            font_size: 20.0,
            alignment: TextAlignment::Center,
            anchor: VerticalAnchor::Middle,
        }
    }

    pub fn with_fill_color(mut self, color: RgbColor) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_text_color(mut self, color: RgbColor) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_font_size(mut self, points: f64) -> Self {
        self.font_size = points;
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_anchor(mut self, anchor: VerticalAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Add a rounded rectangle holding one paragraph of text.
///
/// The box gets a solid fill, a 1pt grey border, a soft outer shadow,
/// word wrap and 0.1in insets. Returns the new shape's id.
pub fn add_rounded_textbox(slide: &mut Slide, spec: &TextBoxSpec) -> ShapeId {
    let id = slide.next_shape_id();
    let mut shape = Shape::new(
        id,
        format!("Rounded Rectangle {}", id.0 - 1),
        ShapeKind::AutoShape {
            preset: Some("roundRect".to_string()),
        },
    );
    shape.geometry = Some(Rect::new(spec.left, spec.top, spec.width, spec.height));
    shape.adjustments = vec![CORNER_ADJUSTMENT];
    shape.fill = Some(Fill::Solid {
        color: Some(ColorValue::Rgb(spec.fill_color)),
    });
    shape.line = Some(LineStyle {
        width: Some(Emu::from_points(1.0)),
        color: Some(ColorValue::Rgb(BORDER_COLOR)),
        ..Default::default()
    });
    shape.shadow = Some(Shadow::soft());
    shape.text = Some(TextFrame {
        paragraphs: vec![TextParagraph {
            text: spec.text.clone(),
            alignment: Some(spec.alignment),
            font: Font {
                name: Some(FONT_FACE.to_string()),
                size: Some(spec.font_size),
                color: Some(spec.text_color),
            },
        }],
        word_wrap: Some(true),
        anchor: Some(spec.anchor),
        margins: Margins::uniform(Emu::from_inches(0.1)),
    });

    debug!(id = %id, text = %spec.text, "added rounded text box");
    slide.push_shape(shape)
}

/// Stroke of an arrow connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowStyle {
    pub color: RgbColor,
    /// Points
    pub width: f64,
    pub head: ArrowHead,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_ARROW_COLOR,
            width: 2.5,
            head: ArrowHead::Triangle,
        }
    }
}

/// Connect the right-center edge of `from` to the left-center edge of `to`
/// with a straight arrow.
///
/// The end points are computed once; moving either shape later does not
/// move the arrow.
pub fn add_arrow_between(
    slide: &mut Slide,
    from: ShapeId,
    to: ShapeId,
    style: &ArrowStyle,
) -> Result<ShapeId> {
    let geometry = |id: ShapeId| -> Result<Rect> {
        slide
            .shape(id)
            .ok_or(Error::ShapeNotFound(id.0))?
            .geometry
            .ok_or(Error::MissingGeometry(id.0))
    };
    let begin = geometry(from)?.right_center();
    let end = geometry(to)?.left_center();

    let id = slide.next_shape_id();
    let (rect, _, _) = Rect::spanning(begin, end);
    let mut shape = Shape::new(
        id,
        format!("Straight Connector {}", id.0 - 1),
        ShapeKind::Connector,
    );
    shape.geometry = Some(rect);
    shape.connector = Some(ConnectorEnds { begin, end });
    shape.line = Some(LineStyle {
        width: Some(Emu::from_points(style.width)),
        color: Some(ColorValue::Rgb(style.color)),
        tail: Some(style.head),
        ..Default::default()
    });

    debug!(id = %id, from = %from, to = %to, "added arrow");
    Ok(slide.push_shape(shape))
}

/// Left offsets for `count` boxes of `box_width`, `gap` apart, centered in
/// `total_width`.
///
/// Fails when the row does not fit. `margin` is the preferred space on each
/// side; a layout that leaves less is still returned, with a warning.
pub fn distribute_horizontally(
    total_width: Emu,
    count: usize,
    box_width: Emu,
    gap: Emu,
    margin: Emu,
) -> Result<Vec<Emu>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if box_width.get() <= 0 {
        return Err(Error::InvalidLayout(format!(
            "box width must be positive, got {}",
            box_width
        )));
    }
    if gap.get() < 0 {
        return Err(Error::InvalidLayout(format!(
            "gap must not be negative, got {}",
            gap
        )));
    }

    let too_many = || Error::InvalidLayout(format!("{} boxes cannot be laid out", count));
    let n = i64::try_from(count).map_err(|_| too_many())?;
    let required = box_width
        .checked_mul(n)
        .zip(gap.checked_mul(n - 1))
        .and_then(|(boxes, gaps)| boxes.checked_add(gaps))
        .ok_or_else(too_many)?;
    if required > total_width {
        return Err(Error::LayoutOverflow {
            required: required.get(),
            available: total_width.get(),
        });
    }

    let start = (total_width - required) / 2;
    if start < margin {
        warn!(
            side = start.get(),
            margin = margin.get(),
            "boxes leave less than the preferred margin"
        );
    }

    Ok((0..n).map(|i| start + (box_width + gap) * i).collect())
}

/// Append a slide using the named layout, or the first layout.
pub fn add_slide(prs: &mut Presentation, layout_name: Option<&str>) -> Result<usize> {
    prs.add_slide(layout_name)
}

/// Set the text of the slide's title placeholder.
pub fn set_title(slide: &mut Slide, text: &str) -> Result<ShapeId> {
    let id = slide.title_id().ok_or(Error::NoTitlePlaceholder)?;
    let shape = slide.shape_mut(id).ok_or(Error::ShapeNotFound(id.0))?;

    let frame = shape.text.get_or_insert_with(TextFrame::default);
    frame.set_text(text);
    let frame = frame.clone();
    if let Some(source) = shape.source.as_deref() {
        let updated = replace_text(source, &frame)?;
        shape.source = Some(updated);
    }
    slide.dirty = true;
    Ok(id)
}
