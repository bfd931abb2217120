//! The extraction pipeline: structured text first, OCR fallback second.
//!
//! One `extract` call walks the state machine
//! `Opened -> StructuredExtracted -> {Done | FallbackRendering ->
//! FallbackRecognized} -> Cleaned -> {Returned | Failed}`. The document
//! handle and the fallback scratch file are owned by the call frame, so
//! dropping them is the cleanup transition and runs on every exit path,
//! including error returns and a caller dropping the future mid-await.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::pdf::{DocumentHandle, PageRaster, PageText, extract_page_text, rasterize_page};

/// Page targeted by the OCR fallback. Résumés are short; recognizing the
/// first page is the designed behavior, not a truncation accident.
const FALLBACK_PAGE: u32 = 1;

/// Which path produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Embedded text runs from the document's text layer.
    Embedded,
    /// Recognition over a rasterized page.
    Ocr,
}

/// Successful pipeline output.
///
/// `text` is the normalized document text; the remaining fields are
/// provenance for callers and tests. A returned `Extraction` never carries
/// whitespace-only text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// Aggregated document text.
    pub text: String,
    /// Pages in the source document.
    pub page_count: u32,
    /// Path that produced `text`.
    pub source: TextSource,
}

/// Drives one document through structured extraction and, when that yields
/// nothing, the rasterize-plus-recognize fallback.
///
/// A pipeline is cheap to share: it holds only configuration and the
/// injected recognition engine, and `extract` takes `&self`, so concurrent
/// invocations on one instance are safe. Per-invocation state lives on the
/// call frame.
pub struct ExtractionPipeline {
    config: ExtractConfig,
    ocr: Arc<dyn OcrEngine>,
}

impl ExtractionPipeline {
    /// Build a pipeline from explicit configuration and an injected
    /// recognition engine.
    pub fn new(config: ExtractConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// The standard pipeline for `config`: the tesseract subprocess engine,
    /// honoring `config.ocr.tesseract_cmd`.
    pub fn from_config(config: ExtractConfig) -> Self {
        let engine = match &config.ocr.tesseract_cmd {
            Some(command) => TesseractOcr::with_command(command),
            None => TesseractOcr::new(),
        };
        Self::new(config, Arc::new(engine))
    }

    /// Extract normalized text from raw document bytes.
    ///
    /// Pages are read strictly in ascending order; one unreadable page
    /// aborts the call as `DocumentCorrupt` rather than returning a
    /// truncated document. If the aggregate trims to nothing, page 1 is
    /// rasterized and handed to the recognition engine; structured and OCR
    /// text are never merged. When both paths come back blank the call
    /// fails with `EmptyContent`.
    ///
    /// `cancel` is observed before the document is opened, before each page
    /// extraction, and before (and during) the OCR call. Cancellation and
    /// failures surface only after scratch state is released.
    pub async fn extract(&self, bytes: &[u8], cancel: &CancellationToken) -> Result<Extraction> {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }

        let doc = DocumentHandle::open(bytes)?;
        let page_count = doc.page_count();

        let mut pages: Vec<PageText> = Vec::with_capacity(page_count as usize);
        for number in doc.page_numbers() {
            if cancel.is_cancelled() {
                debug!("cancelled before extracting page {number}");
                return Err(ExtractError::Cancelled);
            }
            pages.push(extract_page_text(&doc, number)?);
        }
        let text = assemble(&pages);

        if !text.trim().is_empty() {
            info!("extracted embedded text from {page_count} pages");
            return Ok(Extraction {
                text,
                page_count,
                source: TextSource::Embedded,
            });
        }

        if cancel.is_cancelled() {
            debug!("cancelled before OCR fallback");
            return Err(ExtractError::Cancelled);
        }

        info!("no embedded text in {page_count} pages, recognizing page {FALLBACK_PAGE}");
        let raster = rasterize_page(&doc, FALLBACK_PAGE, self.config.raster.scale)?;
        let scratch = self.write_scratch_png(&raster)?;
        let recognized = self.recognize(scratch.path(), cancel).await;

        // Cleanup precedes surfacing the recognition outcome either way.
        debug!("releasing scratch artifact {}", scratch.path().display());
        drop(scratch);
        let text = recognized?;

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }
        Ok(Extraction {
            text,
            page_count,
            source: TextSource::Ocr,
        })
    }

    /// Encode the raster to a uniquely-named PNG inside the scratch
    /// directory. Deleting the file is tied to dropping the returned
    /// handle, which the `extract` frame owns.
    fn write_scratch_png(&self, raster: &PageRaster) -> Result<NamedTempFile> {
        std::fs::create_dir_all(&self.config.scratch_dir).map_err(|e| {
            ExtractError::RenderFailed {
                page: raster.number,
                reason: format!("cannot prepare scratch directory: {e}"),
            }
        })?;

        let mut png = Vec::new();
        raster
            .image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractError::RenderFailed {
                page: raster.number,
                reason: format!("cannot encode raster: {e}"),
            })?;

        let file = tempfile::Builder::new()
            .prefix("cvtext-page-")
            .suffix(".png")
            .tempfile_in(&self.config.scratch_dir)
            .map_err(|e| ExtractError::RenderFailed {
                page: raster.number,
                reason: format!("cannot create scratch file: {e}"),
            })?;
        std::fs::write(file.path(), &png).map_err(|e| ExtractError::RenderFailed {
            page: raster.number,
            reason: format!("cannot write scratch file: {e}"),
        })?;

        debug!(
            "wrote raster for page {} to {}",
            raster.number,
            file.path().display()
        );
        Ok(file)
    }

    /// One recognition attempt, racing the cancellation signal. The
    /// tesseract engine kills its child when the racing future is dropped.
    async fn recognize(&self, image: &Path, cancel: &CancellationToken) -> Result<String> {
        let language = &self.config.ocr.language;
        debug!("recognizing with {} (language {language})", self.ocr.name());
        tokio::select! {
            _ = cancel.cancelled() => Err(ExtractError::Cancelled),
            result = self.ocr.recognize(image, language) => {
                if let Ok(text) = &result {
                    debug!("recognition produced {} characters", text.len());
                }
                result
            }
        }
    }
}

/// Aggregate per-page text runs: fragments within a page in reported order,
/// each followed by a single space; pages in ascending order, each
/// terminated by a newline.
fn assemble(pages: &[PageText]) -> String {
    let mut out = String::new();
    for page in pages {
        for fragment in &page.fragments {
            out.push_str(fragment);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(number: u32, fragments: &[&str]) -> PageText {
        PageText {
            number,
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn assemble_joins_fragments_with_spaces_and_pages_with_newlines() {
        let pages = [
            page(1, &["Experienced engineer."]),
            page(2, &["References available."]),
        ];
        assert_eq!(
            assemble(&pages),
            "Experienced engineer. \nReferences available. \n"
        );
    }

    #[test]
    fn assemble_keeps_fragment_order_within_a_page() {
        let pages = [page(1, &["alpha", "beta", "gamma"])];
        assert_eq!(assemble(&pages), "alpha beta gamma \n");
    }

    #[test]
    fn assemble_of_no_pages_is_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn assemble_of_textless_pages_is_whitespace_only() {
        let pages = [page(1, &[]), page(2, &["   "])];
        assert!(assemble(&pages).trim().is_empty());
    }
}
