//! Global packaging options.

use super::{Arch, Platform};
use std::{collections::BTreeMap, path::PathBuf};

/// Prebuilt host runtime copied into a packaged tree.
#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    /// Directory holding the runtime distribution for one platform.
    pub dir: PathBuf,

    /// Executable (or on darwin, app bundle) name inside `dir`, without
    /// platform suffix.
    pub executable: String,
}

impl RuntimeSettings {
    /// Default runtime executable name for a platform.
    pub fn default_executable(platform: Platform) -> &'static str {
        match platform {
            Platform::Darwin => "Electron",
            _ => "electron",
        }
    }
}

/// Packaging options from the `[packager]` table.
#[derive(Clone, Debug)]
pub struct PackagerSettings {
    /// Wrap app content in an integrity-checked single-file archive.
    pub asar: bool,

    /// Root of all build output (absolute).
    pub out_dir: PathBuf,

    /// Default build target platforms.
    ///
    /// Empty means the host platform.
    pub platforms: Vec<Platform>,

    /// Target architecture.
    pub arch: Arch,

    /// Host runtimes, keyed by platform.
    pub runtimes: BTreeMap<Platform, RuntimeSettings>,
}

impl Default for PackagerSettings {
    fn default() -> Self {
        Self {
            asar: true,
            out_dir: PathBuf::from("out"),
            platforms: Vec::new(),
            arch: Arch::current(),
            runtimes: BTreeMap::new(),
        }
    }
}
