//! Desktop app-shell packager for prebuilt WebGPU clients.
//!
//! This library places a client's prebuilt module, data segment and loader
//! into a desktop app shell and produces per-platform distributables:
//! - compressed archives (.zip) for any platform
//! - Linux packages (.deb, .rpm)
//! - Windows installers (.exe via NSIS)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
