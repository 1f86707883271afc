//! NSIS utility functions.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::Arch,
};
use std::{io::Write, path::Path};

/// Map architecture to NSIS arch string.
pub fn map_arch(arch: Arch) -> Result<&'static str> {
    match arch {
        Arch::X64 => Ok("x64"),
        Arch::Ia32 => Ok("x86"),
        Arch::Arm64 => Ok("arm64"),
        Arch::Armv7l => Err(Error::ArchError(format!(
            "Unsupported architecture for NSIS: {arch}"
        ))),
    }
}

/// Format version string for NSIS VIProductVersion.
///
/// NSIS requires exactly 4 numeric parts (major.minor.patch.build).
/// Pre-release and build suffixes are dropped:
/// - "1" -> "1.0.0.0"
/// - "1.2.3" -> "1.2.3.0"
/// - "1.2.3-beta.1" -> "1.2.3.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
pub fn format_version_for_nsis(version: &str) -> String {
    let core = version.split(['-', '+']).next().unwrap_or(version);
    let mut parts: Vec<&str> = core.split('.').take(4).collect();
    while parts.len() < 4 {
        parts.push("0");
    }
    parts.join(".")
}

/// Escapes a value for use inside an NSIS double-quoted string.
pub fn escape(value: &str) -> String {
    value
        .replace('$', "$$")
        .replace('"', "$\\\"")
        .replace('\n', "$\\n")
}

/// Write file with UTF-8 BOM (required by NSIS).
pub fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path).fs_context("creating NSI script file", path)?;
    file.write_all(&[0xEF, 0xBB, 0xBF])
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .fs_context("writing NSI content", path)?;
    file.flush().fs_context("flushing NSI file", path)?;
    Ok(())
}
