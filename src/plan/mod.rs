//! Edit plans: the structured instructions a model returns.
//!
//! A plan is a JSON object with an `operations` array. Each operation names
//! one helper from [`crate::ops`] in its `op` field; nothing else can be
//! expressed, so applying a plan can never do more than the helpers allow.
//!
//! ```json
//! {"operations": [
//!   {"op": "delete_shapes_except", "slide": 0, "keep": ["title"]},
//!   {"op": "add_rounded_textbox", "slide": 0, "text": "A", "left": "1in",
//!    "top": "2in", "width": "3in", "height": "1.5in", "as": "a"}
//! ]}
//! ```

mod extract;
mod interpreter;
mod length;

pub use extract::extract_plan_text;
pub use interpreter::{apply_plan, Binding, Interpreter};
pub use length::{evaluate, Edge, LengthScope};

use crate::error::{Error, Result};
use crate::model::{ArrowHead, RgbColor, TextAlignment, VerticalAnchor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation names a plan may use.
pub const HELPER_NAMES: &[&str] = &[
    "delete_shapes_except",
    "remove_connectors_and_lines",
    "add_rounded_textbox",
    "add_arrow_between",
    "distribute_horizontally",
    "add_slide",
    "set_title",
];

/// A length: an EMU integer or an expression such as `"1in + 6pt"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Emu(i64),
    Number(f64),
    Expr(String),
}

/// A shape on the operation's slide: a summary id, `"title"` or `"$name"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeRef {
    Id(u32),
    Name(String),
}

/// A slide: a 0-based index or a `"$name"` bound by `add_slide`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideRef {
    Index(i64),
    Name(String),
}

/// One helper invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    DeleteShapesExcept {
        slide: SlideRef,
        #[serde(default)]
        keep: Vec<Option<ShapeRef>>,
    },
    RemoveConnectorsAndLines {
        slide: SlideRef,
    },
    AddRoundedTextbox {
        slide: SlideRef,
        text: String,
        left: Length,
        top: Length,
        width: Length,
        height: Length,
        #[serde(default)]
        fill_color: Option<RgbColor>,
        #[serde(default)]
        text_color: Option<RgbColor>,
        #[serde(default)]
        font_size: Option<f64>,
        #[serde(default)]
        alignment: Option<TextAlignment>,
        #[serde(default)]
        anchor: Option<VerticalAnchor>,
        #[serde(default, rename = "as")]
        bind: Option<String>,
    },
    AddArrowBetween {
        slide: SlideRef,
        from: ShapeRef,
        to: ShapeRef,
        #[serde(default)]
        color: Option<RgbColor>,
        /// Points
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        arrowhead: Option<ArrowHead>,
        #[serde(default, rename = "as")]
        bind: Option<String>,
    },
    DistributeHorizontally {
        /// Defaults to the slide width
        #[serde(default)]
        total_width: Option<Length>,
        count: usize,
        box_width: Length,
        #[serde(default)]
        gap: Option<Length>,
        #[serde(default)]
        margin: Option<Length>,
        #[serde(rename = "as")]
        bind: String,
    },
    AddSlide {
        #[serde(default)]
        layout: Option<String>,
        #[serde(default, rename = "as")]
        bind: Option<String>,
    },
    SetTitle {
        slide: SlideRef,
        text: String,
    },
}

impl Operation {
    /// The helper name, as written in the plan.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::DeleteShapesExcept { .. } => "delete_shapes_except",
            Operation::RemoveConnectorsAndLines { .. } => "remove_connectors_and_lines",
            Operation::AddRoundedTextbox { .. } => "add_rounded_textbox",
            Operation::AddArrowBetween { .. } => "add_arrow_between",
            Operation::DistributeHorizontally { .. } => "distribute_horizontally",
            Operation::AddSlide { .. } => "add_slide",
            Operation::SetTitle { .. } => "set_title",
        }
    }
}

/// A checked, typed edit plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    pub operations: Vec<Operation>,
}

impl EditPlan {
    /// Parse plan text, enforcing the helper catalogue before anything else.
    ///
    /// Text that is not JSON is an [`Error::Extraction`]. A plan with no
    /// operations, or with an `op` outside [`HELPER_NAMES`], is
    /// [`Error::NonCompliant`]. Known operations with bad arguments are
    /// [`Error::InvalidPlan`].
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Extraction(format!("plan is not valid JSON: {}", e)))?;

        let operations = match value {
            Value::Object(mut map) => map
                .remove("operations")
                .ok_or_else(|| Error::NonCompliant("plan has no \"operations\" list".into()))?,
            // A bare list of operations is accepted as well
            list @ Value::Array(_) => list,
            _ => {
                return Err(Error::NonCompliant(
                    "plan must be a JSON object with an \"operations\" list".into(),
                ))
            }
        };
        check_compliance(&operations)?;

        let operations: Vec<Operation> = serde_json::from_value(operations)
            .map_err(|e| Error::InvalidPlan(e.to_string()))?;
        Ok(Self { operations })
    }
}

fn check_compliance(operations: &Value) -> Result<()> {
    let list = operations
        .as_array()
        .ok_or_else(|| Error::NonCompliant("\"operations\" must be a list".into()))?;
    if list.is_empty() {
        return Err(Error::NonCompliant("plan contains no operations".into()));
    }

    for (i, op) in list.iter().enumerate() {
        match op.get("op").and_then(Value::as_str) {
            Some(name) if HELPER_NAMES.contains(&name) => {}
            Some(name) => {
                return Err(Error::NonCompliant(format!(
                    "operation {} uses \"{}\", which is not a sanctioned helper",
                    i + 1,
                    name
                )))
            }
            None => {
                return Err(Error::NonCompliant(format!(
                    "operation {} has no \"op\" name",
                    i + 1
                )))
            }
        }
    }
    Ok(())
}
