//! Error log files
//!
//! Every failed action is written to `<errors_dir>/<timestamp>.txt` so operators
//! can inspect failures after the fact. Writing is best effort: a failure to log
//! never turns into a second error.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.2.0

use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
    enabled: bool,
}

impl ErrorLog {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an error with its context chain; returns the written path
    pub async fn record(&self, context: &str, error: &anyhow::Error) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        let body = format!(
            "{context}\n\n{error:?}\n\nRecorded at {}\n",
            Utc::now().to_rfc3339()
        );

        match self.write(&body).await {
            Ok(path) => {
                debug!("Error written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write error log in {}: {}", self.dir.display(), e);
                None
            }
        }
    }

    async fn write(&self, body: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Colons are not allowed in Windows file names
        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "-");

        let mut path = self.dir.join(format!("{stamp}.txt"));
        let mut attempt = 1;
        while tokio::fs::try_exists(&path).await.unwrap_or(false) {
            path = self.dir.join(format!("{stamp}-{attempt}.txt"));
            attempt += 1;
        }

        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}
