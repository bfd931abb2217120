//! Extract command - pull plain text out of a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cvtext_core::{ExtractError, ExtractionPipeline};

use super::config::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Render scale for the OCR fallback
    #[arg(long)]
    scale: Option<f32>,

    /// OCR language passed to the engine
    #[arg(short, long)]
    lang: Option<String>,

    /// Directory for intermediate page images
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Tesseract executable to use instead of the one on PATH
    #[arg(long)]
    tesseract_cmd: Option<PathBuf>,

    /// Abort extraction after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain extracted text
    Text,
    /// JSON with page count and text source
    Json,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(scale) = args.scale {
        config.raster.scale = scale;
    }
    if let Some(lang) = &args.lang {
        config.ocr.language = lang.clone();
    }
    if let Some(dir) = &args.scratch_dir {
        config.scratch_dir = dir.clone();
    }
    if let Some(cmd) = &args.tesseract_cmd {
        config.ocr.tesseract_cmd = Some(cmd.clone());
    }

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Extracting text from {}", args.input.display());
    let bytes = fs::read(&args.input)?;

    // Ctrl-C and the optional deadline both resolve to the same token.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }
    if let Some(secs) = args.timeout {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            cancel.cancel();
        });
    }

    let pipeline = ExtractionPipeline::from_config(config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Extracting text...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = pipeline.extract(&bytes, &cancel).await;
    pb.finish_and_clear();

    let extraction = result.map_err(|err| user_error(&args.input, err))?;

    debug!(
        "Extracted {} characters from {} pages via {:?}",
        extraction.text.len(),
        extraction.page_count,
        extraction.source
    );

    let output = match args.format {
        OutputFormat::Text => extraction.text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&extraction)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }

    debug!("Total extraction time: {:?}", start.elapsed());

    Ok(())
}

/// Map pipeline failures onto messages a non-operator can act on. The
/// raw error still goes to the log for diagnosis.
fn user_error(input: &Path, err: ExtractError) -> anyhow::Error {
    warn!("extraction failed: {}", err);
    match err {
        ExtractError::DocumentCorrupt(_) => anyhow::anyhow!(
            "{} does not look like a readable PDF document",
            input.display()
        ),
        ExtractError::RenderFailed { page, .. } => anyhow::anyhow!(
            "page {} of {} could not be prepared for OCR",
            page,
            input.display()
        ),
        ExtractError::OcrUnavailable(_) => anyhow::anyhow!(
            "the OCR backend is unavailable; run 'cvtext doctor' to diagnose"
        ),
        ExtractError::OcrFailed(_) => {
            anyhow::anyhow!("OCR could not read text from {}", input.display())
        }
        ExtractError::EmptyContent => {
            anyhow::anyhow!("{} contains no extractable text", input.display())
        }
        ExtractError::Cancelled => anyhow::anyhow!("extraction was cancelled"),
    }
}
