//! Visual rendering of decks to PDF.
//!
//! The PDF is the "visual artifact" attached to model requests. Rendering is
//! optional: without a renderer the assistant works from the structure
//! summary alone.

mod libreoffice;

pub use libreoffice::LibreOfficeRenderer;

use crate::error::Result;
use crate::model::Presentation;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Converts a deck file into a PDF.
pub trait Renderer {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Whether this renderer can produce anything at all.
    fn available(&self) -> bool {
        true
    }

    /// Render `deck` to `<out_dir>/<stem>.pdf` and return that path.
    fn render(&self, deck: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// The renderer used when no conversion engine is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl Renderer for NoRenderer {
    fn name(&self) -> &str {
        "none"
    }

    fn available(&self) -> bool {
        false
    }

    fn render(&self, _deck: &Path, _out_dir: &Path) -> Result<PathBuf> {
        Err(crate::Error::Render("no conversion engine available".into()))
    }
}

/// Pick the best available renderer.
pub fn detect_renderer(command: Option<&str>) -> Box<dyn Renderer> {
    match LibreOfficeRenderer::detect(command) {
        Some(renderer) => Box::new(renderer),
        None => {
            warn!("no conversion engine found; visual inspection disabled");
            Box::new(NoRenderer)
        }
    }
}

/// Path of the visual artifact for `deck`.
pub fn artifact_path(deck: &Path, out_dir: &Path) -> PathBuf {
    let stem = deck
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    out_dir.join(format!("{}.pdf", stem))
}

/// Render the deck at `deck` unless it has no slides.
///
/// Failures are logged and yield `None`; they never stop an instruction.
pub fn render_visual(
    renderer: &dyn Renderer,
    prs: &Presentation,
    deck: &Path,
    out_dir: &Path,
) -> Option<PathBuf> {
    if !renderer.available() {
        debug!("no renderer; working from the structure summary only");
        return None;
    }
    if prs.slide_count() == 0 {
        warn!("presentation has no slides; skipping PDF conversion");
        return None;
    }
    match renderer.render(deck, out_dir) {
        Ok(pdf) => Some(pdf),
        Err(e) => {
            warn!(engine = renderer.name(), error = %e, "rendering failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("/decks/q3 plan.pptx"), Path::new("temp_visuals")),
            PathBuf::from("temp_visuals/q3 plan.pdf")
        );
    }

    #[test]
    fn test_empty_deck_is_not_rendered() {
        let prs = Presentation::new_blank().unwrap();
        let pdf = render_visual(&NoRenderer, &prs, Path::new("x.pptx"), Path::new("."));
        assert!(pdf.is_none());
    }
}
