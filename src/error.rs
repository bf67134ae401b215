//! Error types for the deckpilot library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deckpilot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while inspecting, editing or validating a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file could not be opened as a presentation package.
    #[error("Cannot load presentation {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Error reading or writing the ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the package.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Slide index outside `[0, count)`.
    #[error("Slide index {index} out of range; total slides: {count}")]
    SlideIndexOutOfRange { index: i64, count: usize },

    /// No shape with the given id on the slide.
    #[error("Shape {0} not found on slide")]
    ShapeNotFound(u32),

    /// A shape has no readable position or size.
    #[error("Shape {0} has no readable geometry")]
    MissingGeometry(u32),

    /// The slide has no title placeholder.
    #[error("Slide has no title placeholder")]
    NoTitlePlaceholder,

    /// No slide layout with the given name.
    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    /// A color was not a fully specified RGB triple.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A length expression could not be evaluated.
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Boxes do not fit in the available width.
    #[error("Layout overflow: {required} EMU needed but only {available} EMU available")]
    LayoutOverflow { required: i64, available: i64 },

    /// Layout parameters that cannot produce increasing offsets.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A plan referenced a name that was never bound.
    #[error("Unknown binding: ${0}")]
    UnknownBinding(String),

    /// The edit plan is well-formed JSON but its arguments are wrong.
    #[error("Invalid edit plan: {0}")]
    InvalidPlan(String),

    /// No edit plan could be extracted from the model reply.
    #[error("Could not extract an edit plan: {0}")]
    Extraction(String),

    /// The edit plan does not stick to the sanctioned helper operations.
    #[error("Edit plan rejected: {0}")]
    NonCompliant(String),

    /// The target file appears to be open in another application.
    #[error("{} appears to be open in another application; close it and retry", path.display())]
    Locked { path: PathBuf },

    /// No model client is configured.
    #[error("Model client not initialized (is GOOGLE_API_KEY set?)")]
    ModelUnavailable,

    /// The model call failed.
    #[error("Model error: {0}")]
    Model(String),

    /// Converting the deck to PDF failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Model(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SlideIndexOutOfRange { index: 7, count: 3 };
        assert_eq!(err.to_string(), "Slide index 7 out of range; total slides: 3");

        let err = Error::Locked {
            path: PathBuf::from("deck.pptx"),
        };
        assert_eq!(
            err.to_string(),
            "deck.pptx appears to be open in another application; close it and retry"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
