//! NSIS installer build execution.

use crate::{
    bail,
    bundler::error::{Error, ErrorExt, Result},
};
use std::{path::Path, process::Command};

/// Runs makensis to compile `nsi_path` into `output_path`.
pub fn run_makensis(makensis: &Path, nsi_path: &Path, output_path: &Path) -> Result<()> {
    log::info!("Running makensis...");

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).fs_context("creating installer output directory", parent)?;
    }

    let output = Command::new(makensis)
        .arg("-V3")
        .args(["-INPUTCHARSET", "UTF8", "-OUTPUTCHARSET", "UTF8"])
        .arg(format!("-DOUTPUT_FILE={}", output_path.display()))
        .arg(nsi_path)
        .output()
        .map_err(|e| Error::CommandFailed {
            command: makensis.display().to_string(),
            error: e,
        })?;

    if !output.status.success() {
        bail!(
            "makensis compilation failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    if !output_path.is_file() {
        bail!(
            "makensis reported success but {} was not written",
            output_path.display()
        );
    }

    Ok(())
}
