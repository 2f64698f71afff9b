use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Attempts at finding a free file name before giving up
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Writes malformed status responses to disk for offline inspection.
///
/// One file per response, named `YYYY-MM-DD_HHMMSS.ffffff.log` after the
/// local time of the dump. Existing files are never overwritten.
#[derive(Clone, Debug)]
pub struct DiagnosticDump {
    directory: PathBuf,
}

impl DiagnosticDump {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Serialize `response` into a new dump file and return its path.
    pub async fn write(&self, response: &Value) -> Result<PathBuf> {
        let payload = serde_json::to_vec(response).context("Failed to serialize response")?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .context("Failed to create dump directory")?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.directory.join(file_name(Local::now()));
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    continue;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create dump file {}", path.display()))
                }
            };

            file.write_all(&payload)
                .await
                .context("Failed to write dump file")?;
            file.flush().await.context("Failed to flush dump file")?;
            return Ok(path);
        }

        bail!(
            "No free dump file name in {} after {} attempts",
            self.directory.display(),
            MAX_NAME_ATTEMPTS
        )
    }
}

/// Dump file name for a given time: `2026-10-18_071503.042117.log`
pub fn file_name(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H%M%S%.6f.log").to_string()
}
