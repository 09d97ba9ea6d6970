//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// Document input error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Extraction error from either backend or the pipeline itself.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Archival error.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to document input handling.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input is not one of the accepted formats.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The input carried no bytes at all.
    #[error("document is empty")]
    Empty,

    /// Failed to open/parse the PDF container.
    #[error("failed to parse PDF: {0}")]
    PdfParse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// No raster image could be recovered from the page.
    #[error("no raster image found on PDF page {0}")]
    NoPageImage(u32),

    /// The extracted page image could not be re-encoded.
    #[error("failed to encode page image: {0}")]
    PageEncode(String),
}

/// Failures of the extraction step.
///
/// Everything here aborts the pipeline before a canonical record exists;
/// archival problems are never represented in this enum.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The caller named a backend that does not exist.
    #[error("unknown extraction strategy: {0:?}")]
    InvalidStrategy(String),

    /// The selected backend was never configured. Checked before any
    /// network call is made.
    #[error("{backend} backend is not configured: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },

    /// The structured backend found zero documents in the input.
    #[error("no document detected in input")]
    NoDocumentDetected,

    /// The vision model's response violated the constrained output shape.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// Transport or service-level failure from a backend.
    #[error("{backend} backend request failed: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    /// The poll-until-done wait exceeded its configured bound.
    #[error("{backend} backend did not complete within {seconds}s")]
    Timeout {
        backend: &'static str,
        seconds: u64,
    },

    /// The document could not be prepared for the backend.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

/// Errors from the archival side-channel. The pipeline downgrades these to
/// a warning; they never invalidate an extraction result.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error while persisting the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
