//! Machine-readable make report.

use crate::bundler::{
    error::{ErrorExt, Result},
    settings::Platform,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One produced distributable.
#[derive(Clone, Debug, Serialize)]
pub struct Artifact {
    /// Generator name
    pub generator: String,
    /// Target platform
    pub platform: Platform,
    /// Target architecture
    pub arch: String,
    /// Output file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex SHA-256 of the file
    pub sha256: String,
}

/// A generator/platform pair that was not run.
#[derive(Clone, Debug, Serialize)]
pub struct Skipped {
    pub generator: String,
    pub platform: Platform,
    pub reason: String,
}

/// A generator/platform pair that failed.
#[derive(Clone, Debug, Serialize)]
pub struct Failure {
    pub generator: String,
    pub platform: Platform,
    pub error: String,
}

/// Outcome of a make run.
#[derive(Clone, Debug, Serialize)]
pub struct MakeReport {
    pub generated_at: DateTime<Utc>,
    pub product_name: String,
    pub version: String,
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<Skipped>,
    pub failures: Vec<Failure>,
}

impl MakeReport {
    /// True when no generator failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when some generators failed but others produced output.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.artifacts.is_empty()
    }

    /// Artifacts of one generator.
    pub fn artifacts_of<'a>(&'a self, generator: &'a str) -> impl Iterator<Item = &'a Artifact> + 'a {
        self.artifacts.iter().filter(move |a| a.generator == generator)
    }

    /// Writes the report as pretty JSON.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating report directory", parent)?;
        }
        tokio::fs::write(path, body)
            .await
            .fs_context("writing make report", path)
    }
}
