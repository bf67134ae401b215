//! # deckpilot
//!
//! Instruction-driven editing of PowerPoint decks.
//!
//! A natural-language instruction is turned into an *edit plan* by a
//! language model. The plan can only call a small catalogue of guarded
//! helpers ([`ops`]), so a bad reply can fail but cannot do anything the
//! helpers do not allow.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deckpilot::{load_presentation, summarize};
//!
//! let prs = load_presentation("deck.pptx")?;
//! println!("{}", summarize(&prs));
//! # Ok::<(), deckpilot::Error>(())
//! ```
//!
//! ## Applying a plan directly
//!
//! ```no_run
//! use deckpilot::plan::{apply_plan, EditPlan};
//!
//! let mut prs = deckpilot::load_presentation("deck.pptx")?;
//! let plan = EditPlan::parse(r#"{"operations": [
//!     {"op": "remove_connectors_and_lines", "slide": 0}
//! ]}"#)?;
//! apply_plan(&mut prs, &plan)?;
//! prs.save()?;
//! # Ok::<(), deckpilot::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`ops`]: the mutation helpers
//! - [`summary`]: the text view of a deck given to the model
//! - [`plan`]: edit plan parsing and interpretation
//! - [`pipeline`]: inspect, generate, apply and validate in one place
//! - [`llm`] and [`render`]: the model client and PDF renderer seams

pub mod config;
pub mod container;
pub mod detect;
pub mod error;
pub mod llm;
pub mod lock;
pub mod model;
pub mod ops;
pub mod pipeline;
pub mod plan;
pub mod pptx;
pub mod render;
pub mod summary;

// Re-exports
pub use config::AssistantConfig;
pub use container::{Package, Relationship, Relationships};
pub use detect::{detect_format, is_zip_file, PresentationFormat};
pub use error::{Error, Result};
pub use model::{
    ArrowHead, Emu, Presentation, Rect, RgbColor, Shape, ShapeId, ShapeKind, Slide,
    TextAlignment, TextFrame, VerticalAnchor,
};
pub use ops::{
    add_arrow_between, add_rounded_textbox, delete_shapes_except, distribute_horizontally,
    get_slide, load_presentation, remove_connectors_and_lines, ArrowStyle, TextBoxSpec,
};
pub use pipeline::{Applied, Assistant, Inspection, Verdict};
pub use plan::EditPlan;
pub use summary::summarize;
