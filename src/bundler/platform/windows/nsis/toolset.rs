//! NSIS toolset location.

use crate::bundler::error::{Error, Result};
use std::path::PathBuf;

/// Locates the NSIS compiler.
///
/// `tool` is a command name looked up on `PATH`, or a path to the binary.
pub fn locate_makensis(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|e| {
        Error::GenericError(format!(
            "{tool} not found ({e}). Please install NSIS (e.g., apt-get install nsis)"
        ))
    })
}
