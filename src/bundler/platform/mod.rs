//! Distributable generators.
//!
//! Each generator turns one read-only [`PackagedApp`] into installer or
//! archive files under its own directory of `out/make/`. Generators never
//! depend on each other; the orchestrator runs them concurrently.
//!
//! - [`archive::ZipGenerator`] - compressed archive, any platform
//! - [`linux::DebianGenerator`] - Debian package, linux
//! - [`linux::RpmGenerator`] - RPM package, linux
//! - [`windows::NsisGenerator`] - NSIS installer, win32

pub mod archive;
pub mod linux;
pub mod windows;

use crate::bundler::{
    error::Result,
    packager::PackagedApp,
    settings::{MakerKind, Platform, Settings},
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A producer of distributables from a packaged tree.
pub trait Generator: Send + Sync {
    /// Name used in logs and the make report.
    fn name(&self) -> &str;

    /// Platforms this generator can build for.
    fn supported_platforms(&self) -> &[Platform];

    /// Metadata keys this generator reads; others are ignored.
    fn recognised_metadata(&self) -> &[&str] {
        &[]
    }

    /// Builds distributables for one packaged tree.
    ///
    /// Runs on a blocking thread. Must only write below
    /// [`MakeContext::make_dir`].
    fn make(&self, app: &PackagedApp, ctx: &MakeContext) -> Result<Vec<PathBuf>>;
}

/// Built-in generator for a maker kind.
pub fn generator_for(kind: MakerKind) -> Arc<dyn Generator> {
    match kind {
        MakerKind::Zip => Arc::new(archive::ZipGenerator),
        MakerKind::Deb => Arc::new(linux::DebianGenerator),
        MakerKind::Rpm => Arc::new(linux::RpmGenerator),
        MakerKind::WindowsInstaller => Arc::new(windows::NsisGenerator),
    }
}

/// Inputs shared by one generator run.
#[derive(Clone, Debug)]
pub struct MakeContext {
    /// Validated project settings
    pub settings: Arc<Settings>,
    /// Maker metadata from configuration
    pub metadata: BTreeMap<String, String>,
    /// `out/make`
    pub make_dir: PathBuf,
}

impl MakeContext {
    /// Metadata value for `key`, ignoring empty strings.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Logs metadata keys the generator does not read.
    pub fn log_ignored_keys(&self, generator: &dyn Generator) {
        for key in self.metadata.keys() {
            if !generator.recognised_metadata().contains(&key.as_str()) {
                log::debug!("{}: ignoring unrecognised metadata key '{}'", generator.name(), key);
            }
        }
    }

    /// Whether the packaged app content is an archive.
    pub fn asar(&self) -> bool {
        self.settings.packager().asar
    }
}

/// Timestamp for archive entries.
///
/// Honours `SOURCE_DATE_EPOCH` for reproducible output.
pub fn source_date_epoch() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
}

/// Forward-slash relative path for archive entry names.
pub(crate) fn archive_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
