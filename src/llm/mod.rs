//! Language-model collaborators.
//!
//! The pipeline talks to models through [`ModelClient`], so tests can script
//! replies and other providers can be added without touching the pipeline.

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use std::path::PathBuf;

/// One piece of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// A file sent inline, such as the rendered PDF of the deck
    Document { mime: String, path: PathBuf },
}

/// A single-turn request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model: String,
    pub parts: Vec<Part>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    pub fn pdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.parts.push(Part::Document {
            mime: "application/pdf".to_string(),
            path: path.into(),
        });
        self
    }

    /// Whether any part is a document.
    pub fn has_document(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Document { .. }))
    }
}

/// Something that turns a request into reply text.
pub trait ModelClient {
    fn generate(&self, request: &ModelRequest) -> Result<String>;
}

impl<T: ModelClient + ?Sized> ModelClient for Box<T> {
    fn generate(&self, request: &ModelRequest) -> Result<String> {
        (**self).generate(request)
    }
}
