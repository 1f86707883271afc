//! External tool detection and availability checking.
//!
//! Only the Windows installer shells out (to `makensis`); everything else is
//! written in-process.

use crate::bundler::settings::{MakerKind, Settings};
use std::path::PathBuf;

/// Availability of one external tool.
#[derive(Clone, Debug)]
pub struct ToolStatus {
    /// Command name or path as configured
    pub tool: String,
    /// Generator that needs the tool
    pub required_by: &'static str,
    /// Resolved location, when found
    pub location: Option<PathBuf>,
    /// First line of the tool's version output, when it ran
    pub version: Option<String>,
}

impl ToolStatus {
    /// Whether the tool was found and answered its version query.
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// Looks `tool` up and asks it for its version.
pub fn detect_tool(tool: &str, version_arg: &str, required_by: &'static str) -> ToolStatus {
    let mut status = ToolStatus {
        tool: tool.to_string(),
        required_by,
        location: None,
        version: None,
    };

    let path = match which::which(tool) {
        Ok(path) => path,
        Err(e) => {
            log::debug!("{tool} not found in PATH: {e}");
            return status;
        }
    };
    log::debug!("Found {} at: {}", tool, path.display());

    match std::process::Command::new(&path).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            status.version = Some(version.lines().next().unwrap_or_default().trim().to_string());
        }
        Ok(output) => {
            log::warn!(
                "{} found at {} but {} check failed (exit code: {:?}). Stderr: {}",
                tool,
                path.display(),
                version_arg,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Err(e) => {
            log::warn!(
                "{} found at {} but failed to execute: {}. Check file permissions.",
                tool,
                path.display(),
                e
            );
        }
    }
    status.location = Some(path);
    status
}

/// Tools needed by the enabled makers of `settings`.
pub fn required_tools(settings: &Settings) -> Vec<ToolStatus> {
    settings
        .makers()
        .iter()
        .filter(|m| m.enabled && m.kind == MakerKind::WindowsInstaller)
        .map(|m| {
            let tool = m
                .metadata
                .get("makensis")
                .map(String::as_str)
                .unwrap_or("makensis");
            detect_tool(tool, "-VERSION", "windows-installer")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_is_unavailable() {
        let status = detect_tool("appshell-no-such-tool", "--version", "windows-installer");
        assert!(!status.is_available());
        assert!(status.location.is_none());
    }
}
