//! Operating system identifiers for build targets.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Operating system a packaged tree or distributable is built for.
///
/// Identifiers follow the host runtime's naming (`linux`, `darwin`, `win32`).
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux distributions
    Linux,
    /// macOS
    Darwin,
    /// Windows
    Win32,
}

impl Platform {
    /// Every platform the pipeline knows about.
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Darwin, Platform::Win32];

    /// Runtime identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Win32 => "win32",
        }
    }

    /// Platform of the machine running the bundler.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_os = "windows") {
            Platform::Win32
        } else {
            Platform::Linux
        }
    }

    /// File name of an executable called `base` on this platform.
    pub fn executable_file_name(&self, base: &str) -> String {
        match self {
            Platform::Win32 => format!("{base}.exe"),
            _ => base.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "darwin" | "macos" | "mac" => Ok(Platform::Darwin),
            "win32" | "windows" => Ok(Platform::Win32),
            other => Err(format!(
                "unknown platform '{other}' (expected linux, darwin or win32)"
            )),
        }
    }
}
