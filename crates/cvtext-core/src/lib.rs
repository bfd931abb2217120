//! Core library for résumé text extraction.
//!
//! This crate provides:
//! - PDF parsing with per-page embedded-text extraction
//! - Single-page rasterization for scanned documents
//! - An OCR fallback behind a pluggable recognition engine
//! - The extraction pipeline tying the paths together, with guaranteed
//!   scratch-artifact cleanup on every exit path
//!
//! The entry point is [`ExtractionPipeline::extract`]: raw document bytes
//! and a cancellation token in, normalized text (or one of the typed
//! failures in [`ExtractError`]) out.

pub mod config;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use config::{ExtractConfig, OcrConfig, RasterConfig};
pub use error::{ExtractError, Result};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::{DocumentHandle, PageRaster, PageText};
pub use pipeline::{Extraction, ExtractionPipeline, TextSource};
