//! Doctor command - check that the OCR backend is usable.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use clap::Args;
use console::style;
use tokio::process::Command;

use super::config::load_config;

/// Arguments for the doctor command.
#[derive(Args)]
pub struct DoctorArgs {
    /// Tesseract executable to check instead of the one on PATH
    #[arg(long)]
    tesseract_cmd: Option<PathBuf>,
}

pub async fn run(args: DoctorArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(cmd) = args.tesseract_cmd {
        config.ocr.tesseract_cmd = Some(cmd);
    }

    let program = config
        .ocr
        .tesseract_cmd
        .clone()
        .unwrap_or_else(|| PathBuf::from("tesseract"));

    println!("{} Checking OCR backend", style("▸").cyan());
    println!();

    match probe(&program, &["--version"]).await {
        Some(output) => {
            let first_line = output.lines().next().unwrap_or("unknown version");
            println!(
                "{} {} found: {}",
                style("✓").green(),
                program.display(),
                first_line
            );
        }
        None => {
            println!("{} {} is not runnable", style("✗").red(), program.display());
            println!();
            println!("Install tesseract or point ocr.tesseract_cmd at the executable.");
            anyhow::bail!("OCR backend unavailable");
        }
    }

    let langs = probe(&program, &["--list-langs"]).await.unwrap_or_default();
    let available: Vec<&str> = langs
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of available"))
        .collect();

    if available.is_empty() {
        println!("{} Could not list installed languages", style("⚠").yellow());
    } else if available.contains(&config.ocr.language.as_str()) {
        println!(
            "{} Language '{}' is installed",
            style("✓").green(),
            config.ocr.language
        );
    } else {
        println!(
            "{} Language '{}' is not installed (available: {})",
            style("✗").red(),
            config.ocr.language,
            available.join(", ")
        );
        println!();
        println!("Install the language data or pick one with --lang.");
        anyhow::bail!("OCR language data missing");
    }

    println!();
    println!("{} OCR backend is ready", style("✓").green());

    Ok(())
}

/// Run the executable and capture stdout and stderr as one string.
/// Tesseract writes version and language output to stderr on some
/// builds, so both streams count.
async fn probe(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(text)
}
