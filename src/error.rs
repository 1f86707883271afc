//! Error types for the command line surface.
//!
//! Pipeline failures arrive as [`crate::bundler::Error`] and are wrapped in
//! [`BundlerError`], which adds recovery hints and the process exit code.

use crate::bundler::Error as PipelineError;
use thiserror::Error;

/// Result type alias for command line operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] PipelineError),

    /// Ad-hoc errors with context
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. }) => {
                vec!["Run with --help to see the accepted arguments".to_string()]
            }
            BundlerError::Bundler(error) => pipeline_suggestions(error),
            BundlerError::Io(_) => vec![
                "Check that the output directory is writable".to_string(),
                "Check available disk space".to_string(),
            ],
            BundlerError::Json(_) | BundlerError::Anyhow(_) => {
                vec!["Re-run with RUST_LOG=debug for details".to_string()]
            }
        }
    }

    /// Whether the build can still produce some output after this error.
    ///
    /// Only failures of a single generator leave the other distributables
    /// intact.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BundlerError::Bundler(error) => !error.is_fatal(),
            _ => false,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. }) => 2,
            _ => 1,
        }
    }
}

fn pipeline_suggestions(error: &PipelineError) -> Vec<String> {
    match error {
        PipelineError::Configuration(_) => vec![
            "Fix the reported key in AppShell.toml".to_string(),
            "Run `appshell-bundle check` to validate without building".to_string(),
        ],
        PipelineError::MissingAsset { source_path, .. } => vec![
            format!(
                "Build the client first so that {} exists",
                source_path.display()
            ),
            "Asset sources are resolved relative to the configuration file".to_string(),
        ],
        PipelineError::Transform { .. } => vec![
            "Add a [[rules]] entry whose handlers cover the reported file".to_string(),
            "Check relative require()/import paths in the entry scripts".to_string(),
        ],
        PipelineError::Generator { generator, .. } => vec![
            format!("Check the config table of the '{generator}' maker"),
            "Run `appshell-bundle check` to see missing tools".to_string(),
        ],
        PipelineError::Hardening { .. } => vec![
            "Check that the runtime directory holds an unmodified host runtime".to_string(),
            "Run `appshell-bundle fuses <binary>` to inspect its fuse wire".to_string(),
        ],
        PipelineError::Fs { .. } | PipelineError::IoError(_) => vec![
            "Check file permissions and available disk space".to_string(),
        ],
        PipelineError::CommandFailed { command, .. } => {
            vec![format!("Check that `{command}` is installed and in PATH")]
        }
        _ => vec!["Re-run with RUST_LOG=debug for details".to_string()],
    }
}
