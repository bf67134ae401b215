//! Plain-text structure summary of a presentation.
//!
//! The summary is the model's view of the deck: one block per slide with
//! the layout, the title and one line per remaining shape. Shape ids are
//! included so edit plans can refer to existing shapes.

use crate::error::{Error, Result};
use crate::model::{Fill, Presentation, Shape, Slide};
use serde::Serialize;
use std::fmt::Write as _;

const TEXT_PREVIEW_CHARS: usize = 50;

/// Build the text report for `prs`. Never mutates the presentation.
pub fn summarize(prs: &Presentation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Presentation: {}", prs.file_name());
    let _ = writeln!(out, "Total Slides: {}", prs.slide_count());

    for (i, slide) in prs.slides().iter().enumerate() {
        write_slide(&mut out, i, slide);
    }
    out
}

fn write_slide(out: &mut String, index: usize, slide: &Slide) {
    let _ = writeln!(out, "\n--- Slide {} ---", index + 1);
    let _ = writeln!(out, "Layout: {}", slide.layout_name().unwrap_or("(unknown)"));

    if let Some(title) = slide.title().and_then(Shape::text) {
        if !title.trim().is_empty() {
            let _ = writeln!(out, "Title: '{}'", title);
        }
    }

    let elements: Vec<&Shape> = slide.shapes().iter().filter(|s| !s.is_title()).collect();
    if elements.is_empty() {
        out.push_str("Elements: (None)\n");
        return;
    }

    out.push_str("Elements:\n");
    for shape in elements {
        out.push_str(&shape_line(shape));
        out.push('\n');
    }
}

fn shape_line(shape: &Shape) -> String {
    let mut line = format!("- [id {}] Type: {}", shape.id, shape.kind.label());

    if let Some(frame) = shape.text.as_ref().filter(|f| !f.is_blank()) {
        let _ = write!(line, ", Text: '{}'", preview(&frame.text()));
    }

    match shape.geometry {
        Some(rect) => {
            let _ = write!(
                line,
                ", Pos: ({}, {}), Size: {}x{}",
                rect.left.points().trunc() as i64,
                rect.top.points().trunc() as i64,
                rect.width.points().trunc() as i64,
                rect.height.points().trunc() as i64
            );
        }
        None => line.push_str(", Pos/Size: (unreadable)"),
    }

    let explicit_rgb = shape
        .fill
        .as_ref()
        .filter(|f| matches!(f, Fill::Solid { .. } | Fill::Pattern { .. }))
        .and_then(Fill::fore_color)
        .and_then(|c| c.rgb());
    if let Some(rgb) = explicit_rgb {
        let _ = write!(line, ", Fill: {}", rgb);
    }

    line
}

/// Flatten newlines and cap the length at 50 characters plus `...`.
fn preview(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() > TEXT_PREVIEW_CHARS {
        let cut: String = flat.chars().take(TEXT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    name: String,
    slide_width: i64,
    slide_height: i64,
    slides: &'a [Slide],
}

/// Structured summary for tooling, as pretty-printed JSON.
pub fn to_json(prs: &Presentation) -> Result<String> {
    let summary = SummaryJson {
        name: prs.file_name(),
        slide_width: prs.slide_width().get(),
        slide_height: prs.slide_height().get(),
        slides: prs.slides(),
    };
    serde_json::to_string_pretty(&summary).map_err(|e| Error::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Emu, Rect, ShapeId, ShapeKind, TextFrame, TextParagraph};

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
        assert_eq!(preview("a\nb"), "a b");
        assert_eq!(preview(&"y".repeat(50)), "y".repeat(50));
    }

    #[test]
    fn test_shape_line_unreadable_geometry() {
        let shape = Shape::new(ShapeId(7), "Picture 6", ShapeKind::Picture);
        assert_eq!(
            shape_line(&shape),
            "- [id 7] Type: PICTURE, Pos/Size: (unreadable)"
        );
    }

    #[test]
    fn test_shape_line_text_and_geometry() {
        let mut shape = Shape::new(ShapeId(3), "TextBox 2", ShapeKind::TextBox);
        shape.geometry = Some(Rect::new(
            Emu::from_inches(1.0),
            Emu(12_700 * 10 + 5_000),
            Emu::from_points(200.0),
            Emu::from_points(50.0),
        ));
        shape.text = Some(TextFrame {
            paragraphs: vec![TextParagraph {
                text: "Hello".into(),
                ..Default::default()
            }],
            ..Default::default()
        });
        shape.fill = Some(Fill::Solid {
            color: Some(crate::model::ColorValue::Scheme("accent1".into())),
        });
        assert_eq!(
            shape_line(&shape),
            "- [id 3] Type: TEXT_BOX, Text: 'Hello', Pos: (72, 10), Size: 200x50"
        );
    }

    #[test]
    fn test_summarize_blank_deck() {
        let mut prs = Presentation::new_blank().unwrap();
        prs.add_slide(Some("Blank")).unwrap();
        let text = summarize(&prs);
        assert_eq!(
            text,
            "Presentation: (unsaved)\nTotal Slides: 1\n\n--- Slide 1 ---\nLayout: Blank\nElements: (None)\n"
        );
        assert!(to_json(&prs).unwrap().contains("\"slide_width\": 12192000"));
    }
}
