//! Hardening toggle set applied to the packaged host binary.
//!
//! The runtime binary carries a fuse wire: a fixed sentinel string followed
//! by a version byte, a length byte, and one byte per flag. Flags are
//! flipped in place before any code signing happens.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::{Fuse, HardeningSettings},
};
use std::path::Path;

/// Marker that precedes the fuse wire in the runtime binary.
pub const FUSE_SENTINEL: &[u8] = b"dL7pKGdnNz796PbbjQWNKmHXBZaB9tsX";

/// Fuse wire layout version understood by this module.
pub const FUSE_WIRE_VERSION: u8 = 1;

const FUSE_ENABLED: u8 = b'1';
const FUSE_DISABLED: u8 = b'0';
const FUSE_REMOVED: u8 = b'r';

/// Current state of one fuse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FuseState {
    Enabled,
    Disabled,
    /// The runtime removed this fuse; it can no longer be set
    Removed,
    /// The wire is shorter than this fuse's index
    Absent,
    /// Unrecognised byte
    Unknown(u8),
}

impl FuseState {
    fn from_byte(byte: u8) -> Self {
        match byte {
            FUSE_ENABLED => FuseState::Enabled,
            FUSE_DISABLED => FuseState::Disabled,
            FUSE_REMOVED => FuseState::Removed,
            other => FuseState::Unknown(other),
        }
    }
}

/// Position of the fuse bytes inside a binary image.
struct Wire {
    start: usize,
    len: usize,
}

fn locate_wire(image: &[u8], binary: &Path) -> Result<Wire> {
    let error = |reason: String| Error::Hardening {
        binary: binary.to_path_buf(),
        reason,
    };

    let at = image
        .windows(FUSE_SENTINEL.len())
        .position(|w| w == FUSE_SENTINEL)
        .ok_or_else(|| error("fuse sentinel not found; is this a host runtime binary?".into()))?;

    let header = at + FUSE_SENTINEL.len();
    let version = *image
        .get(header)
        .ok_or_else(|| error("fuse wire truncated after sentinel".into()))?;
    if version != FUSE_WIRE_VERSION {
        return Err(error(format!(
            "unsupported fuse wire version {version} (expected {FUSE_WIRE_VERSION})"
        )));
    }
    let len = *image
        .get(header + 1)
        .ok_or_else(|| error("fuse wire truncated before length".into()))? as usize;
    let start = header + 2;
    if image.len() < start + len {
        return Err(error(format!("fuse wire claims {len} fuses but the binary ends first")));
    }
    Ok(Wire { start, len })
}

/// Reads the state of every known fuse from an in-memory binary image.
pub fn read_fuses(image: &[u8], binary: &Path) -> Result<Vec<(Fuse, FuseState)>> {
    let wire = locate_wire(image, binary)?;
    Ok(Fuse::ALL
        .iter()
        .map(|fuse| {
            let state = if fuse.wire_index() < wire.len {
                FuseState::from_byte(image[wire.start + fuse.wire_index()])
            } else {
                FuseState::Absent
            };
            (*fuse, state)
        })
        .collect())
}

/// Flips the configured fuses in an in-memory binary image.
///
/// Returns the number of bytes that changed. Unconfigured fuses keep
/// whatever the runtime shipped with.
pub fn apply_to_image(image: &mut [u8], settings: &HardeningSettings, binary: &Path) -> Result<usize> {
    let wire = locate_wire(image, binary)?;
    let mut changed = 0;

    for (fuse, enabled) in &settings.flags {
        let index = fuse.wire_index();
        if index >= wire.len {
            return Err(Error::Hardening {
                binary: binary.to_path_buf(),
                reason: format!("fuse '{fuse}' is not present in this runtime's wire"),
            });
        }
        let slot = &mut image[wire.start + index];
        if *slot == FUSE_REMOVED {
            return Err(Error::Hardening {
                binary: binary.to_path_buf(),
                reason: format!("fuse '{fuse}' has been removed from this runtime"),
            });
        }
        let wanted = if *enabled { FUSE_ENABLED } else { FUSE_DISABLED };
        if *slot != wanted {
            *slot = wanted;
            changed += 1;
        }
        log::debug!("fuse {fuse} = {enabled}");
    }

    Ok(changed)
}

/// Applies the toggle set to the binary at `binary`, in place.
///
/// Does nothing when the set is disabled or empty.
pub async fn apply(binary: &Path, settings: &HardeningSettings) -> Result<usize> {
    if !settings.is_active() {
        log::debug!("hardening toggle set inactive; runtime defaults kept");
        return Ok(0);
    }

    let mut image = tokio::fs::read(binary)
        .await
        .fs_context("reading runtime binary", binary)?;
    let changed = apply_to_image(&mut image, settings, binary)?;
    if changed > 0 {
        tokio::fs::write(binary, &image)
            .await
            .fs_context("writing runtime binary", binary)?;
    }

    log::info!(
        "✓ Applied {} hardening flag(s) to {} ({} changed)",
        settings.flags.len(),
        binary.display(),
        changed
    );
    Ok(changed)
}

/// Reads the fuse wire of the binary at `binary`.
pub async fn inspect(binary: &Path) -> Result<Vec<(Fuse, FuseState)>> {
    let image = tokio::fs::read(binary)
        .await
        .fs_context("reading runtime binary", binary)?;
    read_fuses(&image, binary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_runtime(wire: &[u8]) -> Vec<u8> {
        let mut image = b"\x7fELF some code".to_vec();
        image.extend_from_slice(FUSE_SENTINEL);
        image.push(FUSE_WIRE_VERSION);
        image.push(wire.len() as u8);
        image.extend_from_slice(wire);
        image.extend_from_slice(b"trailing data");
        image
    }

    #[test]
    fn flips_only_configured_fuses() {
        let mut image = fake_runtime(b"111001");
        let settings = HardeningSettings::enabled_with([
            (Fuse::RunAsHostRuntime, false),
            (Fuse::EmbeddedArchiveIntegrityCheck, true),
            (Fuse::LoadOnlyFromArchive, true),
        ]);

        let changed = apply_to_image(&mut image, &settings, Path::new("electron")).unwrap();
        assert_eq!(changed, 2);

        let states = read_fuses(&image, Path::new("electron")).unwrap();
        assert_eq!(states[0], (Fuse::RunAsHostRuntime, FuseState::Disabled));
        // Untouched fuses keep their shipped value
        assert_eq!(states[1], (Fuse::CookieEncryption, FuseState::Enabled));
        assert_eq!(states[3], (Fuse::CliInspectArgs, FuseState::Disabled));
        assert_eq!(states[4], (Fuse::EmbeddedArchiveIntegrityCheck, FuseState::Enabled));
        assert!(image.ends_with(b"trailing data"));
    }

    #[test]
    fn missing_sentinel_is_fatal() {
        let mut image = b"not a runtime".to_vec();
        let settings = HardeningSettings::enabled_with([(Fuse::CookieEncryption, true)]);
        let err = apply_to_image(&mut image, &settings, Path::new("app")).unwrap_err();
        assert!(matches!(err, Error::Hardening { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn removed_fuse_cannot_be_set() {
        let mut image = fake_runtime(b"r11001");
        let settings = HardeningSettings::enabled_with([(Fuse::RunAsHostRuntime, false)]);
        let err = apply_to_image(&mut image, &settings, Path::new("electron")).unwrap_err();
        assert!(err.to_string().contains("removed"));
    }

    #[test]
    fn short_wire_reports_absent_fuses() {
        let image = fake_runtime(b"10");
        let states = read_fuses(&image, Path::new("electron")).unwrap();
        assert_eq!(states[1].1, FuseState::Disabled);
        assert_eq!(states[5].1, FuseState::Absent);
    }

    #[test]
    fn wrong_wire_version_is_rejected() {
        let mut image = fake_runtime(b"111111");
        let version_at = image
            .windows(FUSE_SENTINEL.len())
            .position(|w| w == FUSE_SENTINEL)
            .unwrap()
            + FUSE_SENTINEL.len();
        image[version_at] = 7;
        assert!(read_fuses(&image, Path::new("electron")).is_err());
    }

    #[tokio::test]
    async fn inactive_set_leaves_binary_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("electron");
        std::fs::write(&binary, b"no sentinel at all").unwrap();

        let changed = apply(&binary, &HardeningSettings::default()).await.unwrap();
        assert_eq!(changed, 0);
        assert_eq!(std::fs::read(&binary).unwrap(), b"no sentinel at all");
    }

    #[tokio::test]
    async fn apply_rewrites_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("electron");
        std::fs::write(&binary, fake_runtime(b"111111")).unwrap();

        let settings = HardeningSettings::enabled_with([(Fuse::NodeEnvVarOverride, false)]);
        assert_eq!(apply(&binary, &settings).await.unwrap(), 1);

        let states = inspect(&binary).await.unwrap();
        assert_eq!(states[2].1, FuseState::Disabled);
    }
}
