// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inkread: recognize text in an image file, dump the preprocessing variants,
// or check the installed Tesseract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkread_core::{RecognizerConfig, SearchPlan};
use inkread_ocr::{RecognitionEngine, Recognizer, TesseractEngine};
use inkread_vision::Preprocessor;

#[derive(Parser)]
#[command(name = "inkread")]
#[command(about = "Best-effort text extraction from photographed or scanned images")]
struct Cli {
    /// JSON settings file; defaults apply to missing fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize the text in an image
    Recognize {
        image: PathBuf,
        /// Only these characters may be recognized
        #[arg(long)]
        whitelist: Option<String>,
        /// Print the full search report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the three preprocessing variants as PNG files
    Variants {
        image: PathBuf,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Show the Tesseract version and installed languages
    Probe,
    /// Print the effective settings as JSON
    Settings {
        /// Write them to this file instead
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Recognize {
            image,
            whitelist,
            json,
        } => recognize(&config, &image, whitelist.as_deref(), json).await,
        Command::Variants { image, out } => variants(&config, &image, &out).await,
        Command::Probe => probe(&config).await,
        Command::Settings { write } => settings(&config, write.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<RecognizerConfig> {
    match path {
        Some(path) => RecognizerConfig::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(RecognizerConfig::default()),
    }
}

async fn recognize(
    config: &RecognizerConfig,
    image: &Path,
    whitelist: Option<&str>,
    json: bool,
) -> Result<()> {
    let data = tokio::fs::read(image)
        .await
        .with_context(|| format!("failed to read {}", image.display()))?;
    let engine: Arc<dyn RecognitionEngine> = Arc::new(TesseractEngine::from_config(config));
    let recognizer = Recognizer::new(engine, config).context("invalid settings")?;

    let report = recognizer
        .recognize_with_report(&data, whitelist)
        .await
        .with_context(|| format!("failed to recognize {}", image.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.best.text);
        eprintln!(
            "confidence {:.1}, pipeline {}, config {}, {} attempts ({} skipped) in {} ms",
            report.best.confidence,
            or_dash(&report.best.pipeline),
            or_dash(&report.best.config_id),
            report.attempts,
            report.skipped,
            report.elapsed_ms,
        );
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

async fn variants(config: &RecognizerConfig, image: &Path, out: &Path) -> Result<()> {
    let data = tokio::fs::read(image)
        .await
        .with_context(|| format!("failed to read {}", image.display()))?;
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;

    let preprocessor = Preprocessor::new(config.target_long_side);
    let variants = tokio::task::spawn_blocking(move || preprocessor.run_bytes(&data))
        .await
        .context("preprocessing task failed")?
        .with_context(|| format!("failed to decode {}", image.display()))?;
    tracing::info!(dir = %out.display(), count = variants.len(), "Writing variants");
    for variant in &variants {
        let path = variant
            .save_png(out)
            .with_context(|| format!("failed to write variant {}", variant.name()))?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn probe(config: &RecognizerConfig) -> Result<()> {
    let engine = TesseractEngine::from_config(config);
    let info = engine.probe().await.context("tesseract is not usable")?;
    println!("{}", info.version);
    println!("languages: {}", info.languages.join(", "));

    let plan = SearchPlan::from_config(config).context("invalid settings")?;
    let missing = info.missing_languages(plan.languages());
    if missing.is_empty() {
        println!("all configured languages are installed");
    } else {
        println!("missing languages: {}", missing.join(", "));
    }
    Ok(())
}

fn settings(config: &RecognizerConfig, write: Option<&Path>) -> Result<()> {
    match write {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("failed to write settings to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Settings written");
        }
        None => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
