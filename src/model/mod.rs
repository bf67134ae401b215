//! In-memory model of a presentation.
//!
//! The PresentationML reader fills these structures from slide, layout and
//! master XML; the mutation helpers in [`crate::ops`] change them, and the
//! writer turns new shapes back into XML.

mod color;
mod presentation;
mod shape;
mod text;
mod units;

pub use color::*;
pub use presentation::*;
pub use shape::*;
pub use text::*;
pub use units::*;
