//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the cvtext pipeline.
///
/// All settings are explicit constructor inputs to the pipeline; there is
/// no ambient or global configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Page rasterization configuration.
    pub raster: RasterConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Directory that receives per-invocation scratch artifacts (the
    /// fallback raster file). Artifacts are uniquely named and removed
    /// before the invocation returns.
    pub scratch_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            raster: RasterConfig::default(),
            ocr: OcrConfig::default(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Page rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Scale factor applied to the page's intrinsic dimensions when
    /// rendering the fallback image (1.0 = nominal page size).
    pub scale: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self { scale: 1.5 }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language code handed to the recognition engine.
    pub language: String,

    /// Override for the tesseract executable. When unset the engine
    /// resolves `tesseract` via `PATH`.
    pub tesseract_cmd: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tesseract_cmd: None,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
