//! CPU architecture types and per-format naming.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// CPU architecture of a packaged tree.
///
/// Names follow the host runtime (`x64`, `ia32`, `arm64`, `armv7l`); each
/// generator maps them to its own vocabulary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X64,
    /// x86 / i686 (32-bit)
    Ia32,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
    /// ARMv7 with hard-float (32-bit)
    Armv7l,
}

impl Arch {
    /// Runtime identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Ia32 => "ia32",
            Arch::Arm64 => "arm64",
            Arch::Armv7l => "armv7l",
        }
    }

    /// Architecture of the machine running the bundler.
    pub fn current() -> Self {
        Self::from_target_triple(std::env::consts::ARCH)
    }

    /// Detects the architecture from a target triple or bare arch name.
    ///
    /// Unknown prefixes fall back to [`Arch::X64`].
    pub fn from_target_triple(target: &str) -> Self {
        if target.starts_with("x86_64") {
            Arch::X64
        } else if target.starts_with("aarch64") || target.starts_with("arm64") {
            Arch::Arm64
        } else if target.starts_with("arm") {
            Arch::Armv7l
        } else if target.starts_with('i') || target == "x86" {
            Arch::Ia32
        } else {
            Arch::X64
        }
    }

    /// Debian `Architecture:` value.
    pub fn debian(&self) -> &'static str {
        match self {
            Arch::X64 => "amd64",
            Arch::Ia32 => "i386",
            Arch::Arm64 => "arm64",
            Arch::Armv7l => "armhf",
        }
    }

    /// RPM architecture value.
    pub fn rpm(&self) -> &'static str {
        match self {
            Arch::X64 => "x86_64",
            Arch::Ia32 => "i686",
            Arch::Arm64 => "aarch64",
            Arch::Armv7l => "armv7hl",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x64" | "amd64" | "x86_64" => Ok(Arch::X64),
            "ia32" | "x86" | "i686" | "i386" => Ok(Arch::Ia32),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "armv7l" | "armhf" => Ok(Arch::Armv7l),
            other => Err(format!("unknown architecture '{other}'")),
        }
    }
}
