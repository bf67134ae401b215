//! Text frames, paragraphs and font settings.

use super::{Emu, RgbColor};
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    /// Value of `a:pPr/@algn`.
    pub fn to_xml(self) -> &'static str {
        match self {
            TextAlignment::Left => "l",
            TextAlignment::Center => "ctr",
            TextAlignment::Right => "r",
            TextAlignment::Justify => "just",
        }
    }

    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(TextAlignment::Left),
            "ctr" => Some(TextAlignment::Center),
            "r" => Some(TextAlignment::Right),
            "just" | "dist" => Some(TextAlignment::Justify),
            _ => None,
        }
    }
}

/// Vertical placement of text inside its frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    #[default]
    #[serde(alias = "center")]
    Middle,
    Bottom,
}

impl VerticalAnchor {
    /// Value of `a:bodyPr/@anchor`.
    pub fn to_xml(self) -> &'static str {
        match self {
            VerticalAnchor::Top => "t",
            VerticalAnchor::Middle => "ctr",
            VerticalAnchor::Bottom => "b",
        }
    }

    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "t" => Some(VerticalAnchor::Top),
            "ctr" => Some(VerticalAnchor::Middle),
            "b" => Some(VerticalAnchor::Bottom),
            _ => None,
        }
    }
}

/// Run-level font settings of a paragraph (taken from its first run).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<RgbColor>,
}

/// A paragraph of text. Line breaks inside it read back as `\n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextParagraph {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<TextAlignment>,
    pub font: Font,
}

/// Insets between the shape outline and its text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Margins {
    pub left: Option<Emu>,
    pub top: Option<Emu>,
    pub right: Option<Emu>,
    pub bottom: Option<Emu>,
}

impl Margins {
    /// The same inset on all four sides.
    pub fn uniform(value: Emu) -> Self {
        Self {
            left: Some(value),
            top: Some(value),
            right: Some(value),
            bottom: Some(value),
        }
    }
}

/// The text-holding part of a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextFrame {
    pub paragraphs: Vec<TextParagraph>,
    /// `None` when inherited from the layout
    pub word_wrap: Option<bool>,
    pub anchor: Option<VerticalAnchor>,
    pub margins: Margins,
}

impl TextFrame {
    /// Full text, paragraphs joined with `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the frame holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.paragraphs.iter().all(|p| p.text.trim().is_empty())
    }

    /// Replace all text with a single unformatted paragraph.
    pub fn set_text(&mut self, text: &str) {
        let alignment = self.paragraphs.first().and_then(|p| p.alignment);
        self.paragraphs = vec![TextParagraph {
            text: text.to_string(),
            alignment,
            font: Font::default(),
        }];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_paragraphs() {
        let frame = TextFrame {
            paragraphs: vec![
                TextParagraph {
                    text: "first".into(),
                    ..Default::default()
                },
                TextParagraph {
                    text: "second\nline".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(frame.text(), "first\nsecond\nline");
        assert!(!frame.is_blank());
    }

    #[test]
    fn test_anchor_alias() {
        let anchor: VerticalAnchor = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(anchor, VerticalAnchor::Middle);
        assert_eq!(VerticalAnchor::from_xml("b"), Some(VerticalAnchor::Bottom));
        assert_eq!(TextAlignment::Justify.to_xml(), "just");
    }
}
