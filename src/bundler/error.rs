//! Error types for the packaging pipeline.
//!
//! The variants mirror how a failure is handled: configuration, missing-asset,
//! transform and hardening failures stop the build, while [`Error::Generator`]
//! is collected per distributable and reported at the end of a make run.

use crate::bundler::settings::Platform;
use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the packaging pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete configuration, detected before any build work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A declared asset source does not exist at copy time.
    #[error(
        "missing asset for entry point '{entry_point}': {} (destination {})",
        .source_path.display(),
        .destination.display()
    )]
    MissingAsset {
        /// Window whose asset manifest declared the entry
        entry_point: String,
        /// Source path that could not be found
        source_path: PathBuf,
        /// Destination relative to the entry point's output root
        destination: PathBuf,
    },

    /// The content transform pipeline failed on a source file.
    #[error("transform failed for entry point '{entry_point}' at {}: {reason}", .file.display())]
    Transform {
        /// Window being bundled
        entry_point: String,
        /// File that failed to transform
        file: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// A single distributable generator failed.
    #[error("{generator} failed for {platform}: {reason}")]
    Generator {
        /// Generator name (e.g. "deb")
        generator: String,
        /// Platform the generator was producing for
        platform: Platform,
        /// Description of the failure
        reason: String,
    },

    /// Applying the hardening toggle set to the packaged binary failed.
    #[error("hardening failed for {}: {reason}", .binary.display())]
    Hardening {
        /// Binary being patched
        binary: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// I/O failure with the operation and path that caused it.
    #[error("{context} ({}): {error}", .path.display())]
    Fs {
        /// What was being done
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// External command could not be started.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command name
        command: String,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// Unsupported architecture for a generator.
    #[error("architecture error: {0}")]
    ArchError(String),

    /// Generic failure with a message.
    #[error("{0}")]
    GenericError(String),

    /// Plain I/O error.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// ZIP writer error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// RPM builder error.
    #[error("rpm error: {0}")]
    Rpm(#[from] rpm::Error),

    /// JSON encoding or decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
}

impl Error {
    /// Whether this error stops the whole build.
    ///
    /// Only generator failures are recovered from; everything else aborts.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Generator { .. })
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }
}

/// Attach filesystem context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps an I/O error with the operation being performed and the path.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Attach a message to a missing value or a failed result.
pub trait Context<T> {
    /// Converts to a [`Result`], using `context` as the error message.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| match e {
            // Keep pipeline classification intact
            e @ (Error::Configuration(_)
            | Error::MissingAsset { .. }
            | Error::Transform { .. }
            | Error::Generator { .. }
            | Error::Hardening { .. }) => e,
            e => Error::GenericError(format!("{context}: {e}")),
        })
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
