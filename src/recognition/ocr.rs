use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RecognitionConfig;

/// Plain text recognized by a local engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    /// Mean word confidence, 0-100.
    pub confidence: Option<f32>,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("could not start OCR engine `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR engine exited with {status}: {stderr}")]
    Engine { status: ExitStatus, stderr: String },

    #[error("OCR engine did not finish within {0} seconds")]
    Timeout(u64),
}

/// A local optical character recognition engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput, OcrError>;
}

/// Runs the Tesseract command-line engine, one process per image.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
    languages: String,
    timeout_secs: u64,
}

impl TesseractEngine {
    pub fn new(command: String, languages: String, timeout_secs: u64) -> Self {
        Self {
            command,
            languages,
            timeout_secs,
        }
    }

    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self::new(
            config.ocr_command.clone(),
            config.ocr_languages.clone(),
            config.ocr_timeout_secs,
        )
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput, OcrError> {
        let mut context = RecognitionContext::acquire(&self.command, &self.languages)?;
        let tsv = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            context.run(image),
        )
        .await
        .map_err(|_| OcrError::Timeout(self.timeout_secs))??;
        Ok(parse_tsv(&tsv))
    }
}

/// One disposable engine process.
///
/// Released when dropped, whether recognition finished, failed or was
/// abandoned by a timeout.
pub struct RecognitionContext {
    id: Uuid,
    child: Child,
}

impl RecognitionContext {
    pub fn acquire(command: &str, languages: &str) -> Result<Self, OcrError> {
        let child = Command::new(command)
            .args(["stdin", "stdout", "-l", languages, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let id = Uuid::new_v4();
        debug!("Acquired recognition context {}", id);
        Ok(Self { id, child })
    }

    /// Feed the image on stdin and collect the TSV report from stdout.
    pub async fn run(&mut self, image: &[u8]) -> Result<String, OcrError> {
        let mut stdin = self.child.stdin.take().ok_or_else(|| closed_pipe("stdin"))?;
        let mut stdout = self.child.stdout.take().ok_or_else(|| closed_pipe("stdout"))?;
        let mut stderr = self.child.stderr.take().ok_or_else(|| closed_pipe("stderr"))?;

        let write = async move {
            stdin.write_all(image).await?;
            stdin.shutdown().await
        };
        let read_out = async move {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        };
        let read_err = async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        };

        let (written, out, err) = tokio::join!(write, read_out, read_err);
        let status = self.child.wait().await?;
        let stderr = String::from_utf8_lossy(&err.unwrap_or_default()).trim().to_string();

        if !status.success() {
            return Err(OcrError::Engine { status, stderr });
        }
        // The engine may stop reading early once it has decoded the image.
        if let Err(e) = written {
            warn!("Recognition context {}: stdin write failed: {}", self.id, e);
        }
        Ok(String::from_utf8_lossy(&out?).into_owned())
    }
}

impl Drop for RecognitionContext {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.start_kill();
        }
        debug!("Released recognition context {}", self.id);
    }
}

fn closed_pipe(name: &str) -> OcrError {
    OcrError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("{} of OCR engine is not available", name),
    ))
}

/// Rebuild text and mean confidence from Tesseract's TSV report.
///
/// Columns: level page block par line word left top width height conf text.
/// Words (level 5) on the same line are joined by spaces, lines by newlines.
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Option<(u32, u32, u32, u32)> = None;
    let mut conf_sum = 0.0f32;
    let mut conf_count = 0u32;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        match lines.last_mut() {
            Some(line) if current_line == Some(key) => {
                line.push(' ');
                line.push_str(word);
            }
            _ => {
                lines.push(word.to_string());
                current_line = Some(key);
            }
        }
        if let Ok(conf) = cols[10].parse::<f32>() {
            if conf >= 0.0 {
                conf_sum += conf;
                conf_count += 1;
            }
        }
    }

    OcrOutput {
        text: lines.join("\n"),
        confidence: (conf_count > 0).then(|| conf_sum / conf_count as f32),
    }
}
