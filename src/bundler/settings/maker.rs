//! Distributable target declarations.

use super::Platform;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Kind of distributable a target produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum MakerKind {
    /// Compressed archive of the packaged tree, any platform
    #[serde(rename = "zip", alias = "compressed-archive")]
    Zip,
    /// Debian package
    #[serde(rename = "deb", alias = "debian-package")]
    Deb,
    /// Windows installer executable
    #[serde(rename = "windows-installer", alias = "nsis")]
    WindowsInstaller,
    /// RPM package
    #[serde(rename = "rpm", alias = "rpm-package")]
    Rpm,
}

impl MakerKind {
    /// Short generator name used in logs, reports and output paths.
    pub fn name(&self) -> &'static str {
        match self {
            MakerKind::Zip => "zip",
            MakerKind::Deb => "deb",
            MakerKind::WindowsInstaller => "windows-installer",
            MakerKind::Rpm => "rpm",
        }
    }
}

impl fmt::Display for MakerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A metadata value as written in configuration.
///
/// Lists are flattened to a comma-separated string so every generator sees a
/// plain string map.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Plain string
    Text(String),
    /// List of strings
    List(Vec<String>),
    /// Boolean flag
    Flag(bool),
    /// Integer
    Number(i64),
}

impl MetadataValue {
    /// Flattens the value to its string form.
    pub fn into_string(self) -> String {
        match self {
            MetadataValue::Text(s) => s,
            MetadataValue::List(items) => items.join(", "),
            MetadataValue::Flag(b) => b.to_string(),
            MetadataValue::Number(n) => n.to_string(),
        }
    }
}

/// `[[makers]]` entry as declared in configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MakerDecl {
    /// Generator kind
    pub kind: MakerKind,

    /// Disabled makers produce nothing and are not an error.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Platform filter; absent or empty means every targeted platform.
    #[serde(default)]
    pub platforms: Option<Vec<Platform>>,

    /// Generator-specific metadata.
    #[serde(default)]
    pub config: BTreeMap<String, MetadataValue>,
}

fn default_true() -> bool {
    true
}

/// A validated distributable target owned by the orchestrator.
#[derive(Clone, Debug)]
pub struct DistributableTarget {
    /// Generator kind
    pub kind: MakerKind,

    /// Whether the target participates in make runs.
    pub enabled: bool,

    /// Platform filter; empty means every targeted platform.
    pub platforms: Vec<Platform>,

    /// Generator-specific metadata; unknown keys are ignored by generators.
    pub metadata: BTreeMap<String, String>,
}

impl DistributableTarget {
    /// Creates an enabled target with no filter and no metadata.
    pub fn new(kind: MakerKind) -> Self {
        Self {
            kind,
            enabled: true,
            platforms: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Restricts the target to the given platforms.
    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Whether the platform filter admits `platform`.
    pub fn admits(&self, platform: Platform) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&platform)
    }

    /// Platforms this target runs for, given the build targets and what the
    /// generator itself supports. Order follows `targets`.
    pub fn effective_platforms(&self, targets: &[Platform], supported: &[Platform]) -> Vec<Platform> {
        if !self.enabled {
            return Vec::new();
        }
        targets
            .iter()
            .copied()
            .filter(|p| self.admits(*p) && supported.contains(p))
            .collect()
    }
}

impl From<MakerDecl> for DistributableTarget {
    fn from(decl: MakerDecl) -> Self {
        Self {
            kind: decl.kind,
            enabled: decl.enabled,
            platforms: decl.platforms.unwrap_or_default(),
            metadata: decl
                .config
                .into_iter()
                .map(|(k, v)| (k, v.into_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGETS: [Platform; 2] = [Platform::Linux, Platform::Win32];

    #[test]
    fn empty_filter_runs_for_every_target() {
        let zip = DistributableTarget::new(MakerKind::Zip);
        assert_eq!(zip.effective_platforms(&TARGETS, &Platform::ALL), TARGETS.to_vec());
    }

    #[test]
    fn linux_filter_never_runs_for_other_platforms() {
        let deb = DistributableTarget::new(MakerKind::Deb).with_platforms([Platform::Linux]);
        let targets = [Platform::Darwin, Platform::Win32];
        assert!(deb.effective_platforms(&targets, &Platform::ALL).is_empty());
    }

    #[test]
    fn generator_support_narrows_an_open_filter() {
        let installer = DistributableTarget::new(MakerKind::WindowsInstaller);
        assert_eq!(
            installer.effective_platforms(&TARGETS, &[Platform::Win32]),
            vec![Platform::Win32]
        );
    }

    #[test]
    fn disabled_target_runs_nowhere() {
        let mut rpm = DistributableTarget::new(MakerKind::Rpm);
        rpm.enabled = false;
        assert!(rpm.effective_platforms(&TARGETS, &Platform::ALL).is_empty());
    }

    #[test]
    fn metadata_lists_flatten_to_strings() {
        let decl: MakerDecl = toml::from_str(
            r#"
            kind = "debian-package"
            platforms = ["linux"]
            [config]
            maintainer = "Armchair Software"
            depends = ["libgtk-3-0", "libnss3"]
            "#,
        )
        .unwrap();
        let target = DistributableTarget::from(decl);
        assert_eq!(target.kind, MakerKind::Deb);
        assert!(target.enabled);
        assert_eq!(target.metadata["depends"], "libgtk-3-0, libnss3");
    }
}
