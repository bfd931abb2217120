//! Tesseract subprocess engine.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use super::OcrEngine;
use crate::error::{ExtractError, Result};

/// Recognition engine backed by the `tesseract` command-line binary.
///
/// Each call spawns `tesseract <image> stdout -l <language>` and reads the
/// recognized text from stdout. The child is killed if the call is dropped
/// mid-flight, so a cancelled invocation cannot leak a process.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    command: Option<PathBuf>,
}

impl TesseractOcr {
    /// Engine resolving `tesseract` via `PATH`.
    pub fn new() -> Self {
        Self { command: None }
    }

    /// Engine invoking a specific tesseract executable.
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    fn program(&self) -> &Path {
        self.command.as_deref().unwrap_or(Path::new("tesseract"))
    }

    async fn run(&self, image: &Path, language: &str) -> Result<String> {
        let program = self.program();
        debug!(
            "running {} on {} (language {})",
            program.display(),
            image.display(),
            language
        );

        let output = Command::new(program)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(program, &e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            warn!("tesseract exited with {}: {}", output.status, detail);
            return Err(if detail.is_empty() {
                ExtractError::OcrFailed(format!("tesseract exited with {}", output.status))
            } else {
                exit_error(detail)
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ExtractError::OcrFailed("engine produced non-UTF-8 output".to_string()))
    }
}

fn spawn_error(program: &Path, error: &std::io::Error) -> ExtractError {
    if error.kind() == ErrorKind::NotFound {
        ExtractError::OcrUnavailable(format!("{} not found", program.display()))
    } else {
        ExtractError::OcrUnavailable(format!("cannot spawn {}: {}", program.display(), error))
    }
}

/// Classify a non-zero tesseract exit from its stderr. Missing traineddata
/// is an install problem, everything else is a recognition failure.
fn exit_error(stderr: &str) -> ExtractError {
    if stderr.contains("Failed loading language")
        || stderr.contains("tessdata")
        || stderr.contains("TESSDATA_PREFIX")
    {
        ExtractError::OcrUnavailable(format!("missing language data: {stderr}"))
    } else {
        ExtractError::OcrFailed(stderr.to_string())
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize<'a>(
        &'a self,
        image: &'a Path,
        language: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.run(image, language))
    }
}
