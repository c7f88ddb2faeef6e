//! Error types for fillpdf library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fillpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while exporting a filled PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template file does not exist.
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The template exists but could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error serializing the working document back to bytes.
    #[error("PDF serialization error: {0}")]
    Serialize(String),

    /// A draft or user identifier cannot name a file under the exports tree.
    #[error("Invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// The export directory could not be created.
    #[error("Failed to create export directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination file could not be written after exhausting retries.
    #[error("Failed to write {} after {attempts} attempt(s): {source}", path.display())]
    Write {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// A form field rejected its value.
    #[error("Field '{name}' rejected value: {reason}")]
    Field { name: String, reason: String },

    /// An overlay could not be placed.
    #[error("Overlay error: {0}")]
    Overlay(String),

    /// The drawing asset could not be decoded.
    #[error("Image decoding error: {0}")]
    Image(String),

    /// The document has no pages to draw on.
    #[error("Document has no pages")]
    NoPages,

    /// The answer document is not a JSON object.
    #[error("Invalid answer set: {0}")]
    InvalidAnswers(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error happened before anything was written to the destination.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::TemplateNotFound(_)
                | Error::TemplateRead { .. }
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::InvalidIdentifier { .. }
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidAnswers(err.to_string())
    }
}
