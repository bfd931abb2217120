//! Error types for the cvtext-core library.

use thiserror::Error;

/// Failures the extraction pipeline surfaces to its caller.
///
/// The set is flat and closed: each variant maps to one caller-facing
/// condition, and the pipeline re-raises component failures unchanged
/// rather than wrapping or downgrading them. In particular, a failure is
/// never replaced by default text.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input cannot be parsed as a valid document, or a page within it
    /// cannot be read.
    #[error("document cannot be parsed: {0}")]
    DocumentCorrupt(String),

    /// A page could not be rendered to pixels. Also covers the zero-page
    /// document, where the fallback has no page 1 to target.
    #[error("page {page} cannot be rendered: {reason}")]
    RenderFailed { page: u32, reason: String },

    /// The recognition engine could not be invoked at all, e.g. a missing
    /// binary or missing language data. An environment fault, not a
    /// document fault.
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// Recognition was attempted and failed.
    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// The document was readable but neither the embedded-text path nor the
    /// OCR fallback produced usable text.
    #[error("document contains no extractable text")]
    EmptyContent,

    /// The caller's cancellation signal fired before the pipeline finished.
    #[error("extraction cancelled")]
    Cancelled,
}

/// Result type for the cvtext library.
pub type Result<T> = std::result::Result<T, ExtractError>;
