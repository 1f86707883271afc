//! Asset manifest: opaque prebuilt files copied into a renderer output root.
//!
//! Entries are applied in declaration order after the transform pass, so a
//! later entry with the same destination overwrites an earlier one.

use crate::bundler::{
    error::{Error, Result},
    utils::fs,
};
use serde::Deserialize;
use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

/// `[[renderer.entry_points.assets]]` entry as declared in configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetDecl {
    /// Source file, relative to the configuration file or absolute.
    pub from: PathBuf,
    /// Destination relative to the entry point's output root.
    pub to: PathBuf,
}

/// One prebuilt file and where it lands in the packaged output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetEntry {
    source: PathBuf,
    destination: PathBuf,
}

impl AssetEntry {
    /// Creates an entry, normalising `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the destination is empty,
    /// absolute, or climbs out of the packaging root.
    pub fn new(source: impl Into<PathBuf>, destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref();
        let mut normalized = PathBuf::new();
        for component in destination.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::config(format!(
                        "asset destination {} must stay inside the packaging root",
                        destination.display()
                    )));
                }
            }
        }
        if normalized.as_os_str().is_empty() {
            return Err(Error::config("asset destination cannot be empty"));
        }
        Ok(Self {
            source: source.into(),
            destination: normalized,
        })
    }

    /// Absolute source path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination relative to the packaging root.
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Ordered list of asset copies for one entry point.
#[derive(Clone, Debug, Default)]
pub struct AssetManifest {
    entries: Vec<AssetEntry>,
}

impl AssetManifest {
    /// Creates a manifest from entries in application order.
    pub fn new(entries: Vec<AssetEntry>) -> Self {
        Self { entries }
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: AssetEntry) {
        self.entries.push(entry);
    }

    /// Entries in application order.
    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destinations targeted by more than one entry, in first-seen order.
    pub fn overlapping_destinations(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        let mut overlapping: Vec<&Path> = Vec::new();
        for entry in &self.entries {
            let dest = entry.destination();
            if !seen.insert(dest) && !overlapping.contains(&dest) {
                overlapping.push(dest);
            }
        }
        overlapping
    }

    /// Copies every entry under `root`, creating directories as needed.
    ///
    /// All sources are checked before the first write so a missing asset
    /// never leaves a half-populated root. Returns the written paths in
    /// application order.
    pub async fn apply(&self, root: &Path, entry_point: &str) -> Result<Vec<PathBuf>> {
        for entry in &self.entries {
            if !tokio::fs::metadata(entry.source())
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                return Err(Error::MissingAsset {
                    entry_point: entry_point.to_string(),
                    source_path: entry.source().to_path_buf(),
                    destination: entry.destination().to_path_buf(),
                });
            }
        }

        for dest in self.overlapping_destinations() {
            log::warn!(
                "[{}] several assets target {}; the last declared one wins",
                entry_point,
                dest.display()
            );
        }

        let mut written = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let target = root.join(entry.destination());
            fs::copy_file(entry.source(), &target).await?;
            log::debug!(
                "[{}] copied {} -> {}",
                entry_point,
                entry.source().display(),
                target.display()
            );
            written.push(target);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_are_normalised_and_confined() {
        let entry = AssetEntry::new("/src/client.wasm", "./wasm/client.wasm").unwrap();
        assert_eq!(entry.destination(), Path::new("wasm/client.wasm"));

        assert!(AssetEntry::new("/src/a", "../escape").is_err());
        assert!(AssetEntry::new("/src/a", "/etc/passwd").is_err());
        assert!(AssetEntry::new("/src/a", ".").is_err());
    }

    #[test]
    fn reports_overlapping_destinations_once() {
        let manifest = AssetManifest::new(vec![
            AssetEntry::new("/a", "client.js").unwrap(),
            AssetEntry::new("/b", "client.js").unwrap(),
            AssetEntry::new("/c", "./client.js").unwrap(),
            AssetEntry::new("/d", "client.wasm").unwrap(),
        ]);
        assert_eq!(manifest.overlapping_destinations(), vec![Path::new("client.js")]);
    }

    #[tokio::test]
    async fn copies_bytes_exactly() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        std::fs::write(src.path().join("client.data"), &payload).unwrap();

        let manifest = AssetManifest::new(vec![
            AssetEntry::new(src.path().join("client.data"), "nested/dir/client.data").unwrap(),
        ]);
        let written = manifest.apply(out.path(), "main_window").await.unwrap();

        assert_eq!(written, vec![out.path().join("nested/dir/client.data")]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), payload);
    }

    #[tokio::test]
    async fn last_declared_entry_wins_on_collision() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("first.js"), b"first").unwrap();
        std::fs::write(src.path().join("second.js"), b"second").unwrap();

        let manifest = AssetManifest::new(vec![
            AssetEntry::new(src.path().join("first.js"), "client.js").unwrap(),
            AssetEntry::new(src.path().join("second.js"), "client.js").unwrap(),
        ]);
        manifest.apply(out.path(), "main_window").await.unwrap();

        assert_eq!(std::fs::read(out.path().join("client.js")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn missing_source_aborts_before_any_write() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("client.js"), b"loader").unwrap();

        let manifest = AssetManifest::new(vec![
            AssetEntry::new(src.path().join("client.js"), "client.js").unwrap(),
            AssetEntry::new(src.path().join("client.wasm"), "client.wasm").unwrap(),
        ]);
        let err = manifest.apply(out.path(), "main_window").await.unwrap_err();

        match err {
            Error::MissingAsset { entry_point, source_path, .. } => {
                assert_eq!(entry_point, "main_window");
                assert!(source_path.ends_with("client.wasm"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.path().join("client.js").exists());
    }
}
