//! Shapes and their formatting.

use super::{ColorValue, Emu, Point, Rect, TextFrame};
use serde::{Deserialize, Serialize};

/// Slide-unique shape identifier (`p:cNvPr/@id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder role (`p:ph/@type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    Date,
    Footer,
    SlideNumber,
    Picture,
    Other(String),
}

impl PlaceholderType {
    /// Parse `p:ph/@type`; an absent attribute means an object placeholder.
    pub fn from_xml(value: Option<&str>) -> Self {
        match value {
            None | Some("obj") => PlaceholderType::Object,
            Some("title") => PlaceholderType::Title,
            Some("ctrTitle") => PlaceholderType::CenterTitle,
            Some("subTitle") => PlaceholderType::Subtitle,
            Some("body") => PlaceholderType::Body,
            Some("dt") => PlaceholderType::Date,
            Some("ftr") => PlaceholderType::Footer,
            Some("sldNum") => PlaceholderType::SlideNumber,
            Some("pic") => PlaceholderType::Picture,
            Some(other) => PlaceholderType::Other(other.to_string()),
        }
    }

    pub fn to_xml(&self) -> &str {
        match self {
            PlaceholderType::Title => "title",
            PlaceholderType::CenterTitle => "ctrTitle",
            PlaceholderType::Subtitle => "subTitle",
            PlaceholderType::Body => "body",
            PlaceholderType::Object => "obj",
            PlaceholderType::Date => "dt",
            PlaceholderType::Footer => "ftr",
            PlaceholderType::SlideNumber => "sldNum",
            PlaceholderType::Picture => "pic",
            PlaceholderType::Other(s) => s,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, PlaceholderType::Title | PlaceholderType::CenterTitle)
    }

    /// The master placeholder type this one inherits from.
    pub fn master_type(&self) -> PlaceholderType {
        match self {
            PlaceholderType::CenterTitle => PlaceholderType::Title,
            PlaceholderType::Subtitle | PlaceholderType::Object => PlaceholderType::Body,
            other => other.clone(),
        }
    }
}

/// What kind of element a shape is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    Placeholder {
        ph_type: PlaceholderType,
        idx: Option<u32>,
    },
    TextBox,
    AutoShape {
        preset: Option<String>,
    },
    /// An `p:sp` drawn with a line preset
    Line,
    /// A `p:cxnSp`
    Connector,
    Picture,
    Group,
    GraphicFrame,
    Other {
        tag: String,
    },
}

impl ShapeKind {
    /// Label used in structure summaries.
    pub fn label(&self) -> String {
        match self {
            ShapeKind::Placeholder { ph_type, .. } => format!("PLACEHOLDER ({})", ph_type.to_xml()),
            ShapeKind::TextBox => "TEXT_BOX".to_string(),
            ShapeKind::AutoShape { preset: Some(p) } => format!("AUTO_SHAPE ({})", p),
            ShapeKind::AutoShape { preset: None } => "AUTO_SHAPE".to_string(),
            ShapeKind::Line => "LINE".to_string(),
            ShapeKind::Connector => "CONNECTOR".to_string(),
            ShapeKind::Picture => "PICTURE".to_string(),
            ShapeKind::Group => "GROUP".to_string(),
            ShapeKind::GraphicFrame => "GRAPHIC_FRAME".to_string(),
            ShapeKind::Other { tag } => format!("OTHER ({})", tag),
        }
    }
}

/// Shape fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    NoFill,
    Solid { color: Option<ColorValue> },
    Pattern { foreground: Option<ColorValue> },
    Gradient,
    Picture,
    Group,
}

impl Fill {
    /// Foreground color of solid and patterned fills.
    pub fn fore_color(&self) -> Option<&ColorValue> {
        match self {
            Fill::Solid { color } => color.as_ref(),
            Fill::Pattern { foreground } => foreground.as_ref(),
            _ => None,
        }
    }
}

/// Line-end decoration (`a:headEnd` / `a:tailEnd`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHead {
    #[default]
    Triangle,
    Stealth,
    Diamond,
    Oval,
    Arrow,
}

impl ArrowHead {
    pub fn to_xml(self) -> &'static str {
        match self {
            ArrowHead::Triangle => "triangle",
            ArrowHead::Stealth => "stealth",
            ArrowHead::Diamond => "diamond",
            ArrowHead::Oval => "oval",
            ArrowHead::Arrow => "arrow",
        }
    }

    /// Parse an end type; `none` and unknown values yield `None`.
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "triangle" => Some(ArrowHead::Triangle),
            "stealth" => Some(ArrowHead::Stealth),
            "diamond" => Some(ArrowHead::Diamond),
            "oval" => Some(ArrowHead::Oval),
            "arrow" => Some(ArrowHead::Arrow),
            _ => None,
        }
    }
}

/// Outline of a shape or the stroke of a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineStyle {
    pub width: Option<Emu>,
    pub color: Option<ColorValue>,
    /// `a:ln/a:noFill`
    pub hidden: bool,
    pub head: Option<ArrowHead>,
    pub tail: Option<ArrowHead>,
}

/// Shadow placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowStyle {
    Outer,
    Inner,
}

/// A drop shadow. The shadow color is not part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub style: ShadowStyle,
    pub distance: Emu,
    /// Direction in degrees, clockwise from the positive x axis
    pub angle: f64,
    pub blur_radius: Emu,
    /// 0.0 (opaque) to 1.0 (invisible)
    pub transparency: f64,
}

impl Shadow {
    /// The soft shadow given to every rounded text box.
    pub fn soft() -> Self {
        Self {
            style: ShadowStyle::Outer,
            distance: Emu::from_points(3.0),
            angle: 45.0,
            blur_radius: Emu::from_points(4.0),
            transparency: 0.5,
        }
    }
}

/// Begin and end points of a connector, fixed when it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectorEnds {
    pub begin: Point,
    pub end: Point,
}

/// A visual element on a slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ShapeKind,
    /// `None` when neither the shape nor its layout defines a position
    pub geometry: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    /// Preset geometry adjustments as fractions (`val 15000` is 0.15)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<ConnectorEnds>,
    /// Whether `geometry` came from the layout or master
    #[serde(skip)]
    pub(crate) geometry_inherited: bool,
    /// Highest `cNvPr` id inside this element, nested shapes included
    #[serde(skip)]
    pub(crate) max_nested_id: u32,
    /// Original XML of a shape loaded from a file; written back verbatim
    #[serde(skip)]
    pub(crate) source: Option<String>,
}

impl Shape {
    /// A shape with no formatting, not backed by any XML yet.
    pub fn new(id: ShapeId, name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            geometry: None,
            text: None,
            fill: None,
            line: None,
            shadow: None,
            adjustments: Vec::new(),
            connector: None,
            geometry_inherited: false,
            max_nested_id: id.0,
            source: None,
        }
    }

    /// Title or center-title placeholder.
    pub fn is_title(&self) -> bool {
        matches!(&self.kind, ShapeKind::Placeholder { ph_type, .. } if ph_type.is_title())
    }

    /// Lines and connectors.
    pub fn is_line_like(&self) -> bool {
        matches!(self.kind, ShapeKind::Line | ShapeKind::Connector)
    }

    pub fn has_text_frame(&self) -> bool {
        self.text.is_some()
    }

    /// Text of the frame, if the shape has one.
    pub fn text(&self) -> Option<String> {
        self.text.as_ref().map(TextFrame::text)
    }

    /// Whether this shape was created in memory and has no XML yet.
    pub fn is_new(&self) -> bool {
        self.source.is_none()
    }

    pub fn placeholder_type(&self) -> Option<&PlaceholderType> {
        match &self.kind {
            ShapeKind::Placeholder { ph_type, .. } => Some(ph_type),
            _ => None,
        }
    }
}
