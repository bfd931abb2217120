//! PDF parsing, embedded-text extraction, and page rasterization.

mod document;
mod extract;
mod raster;

pub use document::DocumentHandle;
pub use extract::{PageText, extract_page_text};
pub use raster::{PageRaster, rasterize_page};
