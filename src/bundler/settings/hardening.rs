//! Hardening toggle set configuration.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Named capability flag baked into the packaged host binary.
///
/// The discriminant is the flag's position in the runtime's fuse wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fuse {
    /// Lets the binary run as a plain script host via an environment variable
    RunAsHostRuntime = 0,
    /// Encrypts the cookie store at rest
    CookieEncryption = 1,
    /// Honours the runtime options environment variable
    NodeEnvVarOverride = 2,
    /// Honours `--inspect` style command-line arguments
    CliInspectArgs = 3,
    /// Validates the embedded app archive against its integrity record
    EmbeddedArchiveIntegrityCheck = 4,
    /// Refuses to load the app from anywhere but the app archive
    LoadOnlyFromArchive = 5,
}

impl Fuse {
    /// Every known flag in wire order.
    pub const ALL: [Fuse; 6] = [
        Fuse::RunAsHostRuntime,
        Fuse::CookieEncryption,
        Fuse::NodeEnvVarOverride,
        Fuse::CliInspectArgs,
        Fuse::EmbeddedArchiveIntegrityCheck,
        Fuse::LoadOnlyFromArchive,
    ];

    /// Index of this flag's byte in the fuse wire.
    pub fn wire_index(&self) -> usize {
        *self as usize
    }

    /// Configuration key.
    pub fn name(&self) -> &'static str {
        match self {
            Fuse::RunAsHostRuntime => "run-as-host-runtime",
            Fuse::CookieEncryption => "cookie-encryption",
            Fuse::NodeEnvVarOverride => "node-env-var-override",
            Fuse::CliInspectArgs => "cli-inspect-args",
            Fuse::EmbeddedArchiveIntegrityCheck => "embedded-archive-integrity-check",
            Fuse::LoadOnlyFromArchive => "load-only-from-archive",
        }
    }
}

impl fmt::Display for Fuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `[hardening]` table as declared in configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct HardeningDecl {
    /// Applies the toggle set when true.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub run_as_host_runtime: Option<bool>,
    #[serde(default)]
    pub cookie_encryption: Option<bool>,
    #[serde(default)]
    pub node_env_var_override: Option<bool>,
    #[serde(default)]
    pub cli_inspect_args: Option<bool>,
    #[serde(default)]
    pub embedded_archive_integrity_check: Option<bool>,
    #[serde(default)]
    pub load_only_from_archive: Option<bool>,
}

/// Validated hardening toggle set.
///
/// Only flags present in `flags` are written; absent flags keep the
/// runtime's built-in default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HardeningSettings {
    /// Whether the toggle set is applied at all.
    pub enabled: bool,

    /// Explicitly configured flags.
    pub flags: BTreeMap<Fuse, bool>,
}

impl HardeningSettings {
    /// An enabled toggle set with the given flags.
    pub fn enabled_with(flags: impl IntoIterator<Item = (Fuse, bool)>) -> Self {
        Self {
            enabled: true,
            flags: flags.into_iter().collect(),
        }
    }

    /// Whether applying this set would touch the binary.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.flags.is_empty()
    }
}

impl From<HardeningDecl> for HardeningSettings {
    fn from(decl: HardeningDecl) -> Self {
        let pairs = [
            (Fuse::RunAsHostRuntime, decl.run_as_host_runtime),
            (Fuse::CookieEncryption, decl.cookie_encryption),
            (Fuse::NodeEnvVarOverride, decl.node_env_var_override),
            (Fuse::CliInspectArgs, decl.cli_inspect_args),
            (Fuse::EmbeddedArchiveIntegrityCheck, decl.embedded_archive_integrity_check),
            (Fuse::LoadOnlyFromArchive, decl.load_only_from_archive),
        ];
        Self {
            enabled: decl.enabled,
            flags: pairs
                .into_iter()
                .filter_map(|(fuse, value)| value.map(|v| (fuse, v)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_flags_are_left_to_the_runtime() {
        let decl: HardeningDecl = toml::from_str(
            r#"
            enabled = true
            run-as-host-runtime = false
            cookie-encryption = true
            "#,
        )
        .unwrap();
        let settings = HardeningSettings::from(decl);
        assert!(settings.is_active());
        assert_eq!(settings.flags.len(), 2);
        assert!(!settings.flags.contains_key(&Fuse::LoadOnlyFromArchive));
    }

    #[test]
    fn disabled_by_default() {
        let settings = HardeningSettings::from(HardeningDecl::default());
        assert!(!settings.enabled);
        assert!(!settings.is_active());
    }

    #[test]
    fn wire_order_is_fixed() {
        let indices: Vec<_> = Fuse::ALL.iter().map(Fuse::wire_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
