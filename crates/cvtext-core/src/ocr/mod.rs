//! Recognition engines for the raster fallback path.
//!
//! The pipeline never talks to a concrete engine. It holds an injected
//! `OcrEngine` trait object, so tests can substitute scripted engines and
//! deployments can swap the recognizer without touching the pipeline.

mod tesseract;

pub use tesseract::TesseractOcr;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::Result;

/// A recognition engine the pipeline hands a rendered page image to.
///
/// Implementations must be stateless across calls: one shared instance may
/// serve many concurrent invocations, and `recognize` must not retain
/// `image` beyond the call (the file is deleted when the invocation
/// finishes).
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize text in the image file at `image`.
    ///
    /// Fails with `OcrUnavailable` when the engine cannot run at all and
    /// with `OcrFailed` when recognition was attempted and failed. An empty
    /// string is a valid success value; judging it is the caller's job.
    fn recognize<'a>(
        &'a self,
        image: &'a Path,
        language: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}
