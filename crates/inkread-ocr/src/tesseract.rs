// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract command-line adapter.
//
// Each call writes the variant to a scratch PNG and runs
// `tesseract <png> stdout -l <langs> <config...> tsv`. The child process is
// killed if the call is dropped (timeout or request cancellation).

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use inkread_core::error::{InkreadError, Result};
use inkread_core::{EngineError, LanguageSet, Recognition, RecognizerConfig};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::engine::RecognitionEngine;

/// TSV row level of a single word.
const WORD_LEVEL: u32 = 5;

/// What `tesseract --version` and `--list-langs` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub version: String,
    pub languages: Vec<String>,
}

impl EngineInfo {
    /// Language codes referenced by `sets` that are not installed.
    pub fn missing_languages<'a>(&self, sets: impl IntoIterator<Item = &'a LanguageSet>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for set in sets {
            for code in set.codes() {
                if !self.languages.iter().any(|lang| lang == code)
                    && !missing.iter().any(|seen| seen == code)
                {
                    missing.push(code.to_string());
                }
            }
        }
        missing
    }
}

/// Runs the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self::new(&config.tesseract_binary)
    }

    /// Query the installed version and languages.
    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    pub async fn probe(&self) -> Result<EngineInfo> {
        let version_output = self.run_simple("--version").await?;
        let version = parse_version(&version_output)
            .ok_or_else(|| InkreadError::EngineUnavailable("no version reported".into()))?;

        let langs_output = self.run_simple("--list-langs").await?;
        let languages = parse_language_list(&String::from_utf8_lossy(&langs_output.stdout));

        info!(%version, languages = languages.len(), "Tesseract probed");
        Ok(EngineInfo { version, languages })
    }

    async fn run_simple(&self, flag: &str) -> Result<Output> {
        let output = Command::new(&self.binary)
            .arg(flag)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                InkreadError::EngineUnavailable(format!("{}: {}", self.binary.display(), err))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InkreadError::EngineUnavailable(format!(
                "{} {} failed: {}",
                self.binary.display(),
                flag,
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &str,
    ) -> std::result::Result<Recognition, EngineError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| EngineError::Failed {
                detail: format!("could not encode input: {}", err),
            })?;

        let scratch = tempfile::Builder::new()
            .prefix("inkread-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| EngineError::Failed {
                detail: format!("could not create scratch file: {}", err),
            })?;
        tokio::fs::write(scratch.path(), &png)
            .await
            .map_err(|err| EngineError::Failed {
                detail: format!("could not write scratch file: {}", err),
            })?;

        let output = Command::new(&self.binary)
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .args(config.split_whitespace())
            .arg("tsv")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| EngineError::Spawn {
                detail: format!("{}: {}", self.binary.display(), err),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                detail: format!("exit {}: {}", output.status, stderr.trim()),
            });
        }
        let tsv = String::from_utf8(output.stdout).map_err(|err| EngineError::Output {
            detail: format!("output is not UTF-8: {}", err),
        })?;
        let recognition = parse_tsv(&tsv)?;
        debug!(
            languages,
            config,
            chars = recognition.text.chars().count(),
            tokens = recognition.confidences.len(),
            "Tesseract finished"
        );
        Ok(recognition)
    }
}

/// Parse Tesseract TSV output.
///
/// Word rows become text: words on one line are joined with spaces, lines
/// with `\n`, and a blank line separates paragraphs. The `conf` column of
/// every row is kept, including the `-1` of non-word rows.
pub fn parse_tsv(tsv: &str) -> std::result::Result<Recognition, EngineError> {
    if tsv.trim().is_empty() {
        return Ok(Recognition::default());
    }
    let mut rows = tsv.lines();
    if !rows.next().is_some_and(|header| header.starts_with("level")) {
        return Err(EngineError::Output {
            detail: "missing TSV header".into(),
        });
    }

    let mut text = String::new();
    let mut confidences = Vec::new();
    let mut last_line: Option<(u32, u32, u32, u32)> = None;

    for row in rows.filter(|row| !row.trim().is_empty()) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            return Err(EngineError::Output {
                detail: format!("short TSV row: {row:?}"),
            });
        }
        let field = |idx: usize| -> std::result::Result<u32, EngineError> {
            cols[idx].trim().parse().map_err(|_| EngineError::Output {
                detail: format!("bad TSV field {idx} in {row:?}"),
            })
        };
        let conf: f32 = cols[10].trim().parse().map_err(|_| EngineError::Output {
            detail: format!("bad confidence in {row:?}"),
        })?;
        confidences.push(conf);

        let word = cols.get(11).map(|word| word.trim()).unwrap_or_default();
        if field(0)? != WORD_LEVEL || word.is_empty() {
            continue;
        }
        let line = (field(1)?, field(2)?, field(3)?, field(4)?);
        match last_line {
            Some(prev) if prev == line => text.push(' '),
            Some(prev) if prev.0 == line.0 && prev.1 == line.1 && prev.2 == line.2 => {
                text.push('\n')
            }
            Some(_) => text.push_str("\n\n"),
            None => {}
        }
        text.push_str(word);
        last_line = Some(line);
    }

    Ok(Recognition::new(text, confidences))
}

/// First line of `--version` output, e.g. `tesseract 5.3.4`. Older releases
/// print it on stderr.
fn parse_version(output: &Output) -> Option<String> {
    [&output.stdout, &output.stderr]
        .into_iter()
        .map(|stream| String::from_utf8_lossy(stream))
        .find_map(|text| {
            text.lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
}

/// Language codes from `--list-langs`, skipping the heading line.
fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
