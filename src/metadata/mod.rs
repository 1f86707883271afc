//! Project configuration from `AppShell.toml`.
//!
//! The file is parsed once into declaration types, then turned into
//! validated [`Settings`] through [`SettingsBuilder`]. Relative paths are
//! resolved against the directory holding the file.

use crate::bundler::{
    self, BundleRule, EntryPoint, Error, PackageSettings, PackagerSettings, Settings,
    SettingsBuilder,
    renderer::{RendererLayout, RuleDecl},
    settings::{
        Arch, DistributableTarget, EntryPointDecl, HardeningDecl, MakerDecl, Platform,
        RuntimeSettings,
    },
};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Configuration file looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "AppShell.toml";

/// `[package]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDecl {
    pub name: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub executable_name: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

/// `[packager.runtime.<platform>]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeDecl {
    pub dir: PathBuf,
    #[serde(default)]
    pub executable: Option<String>,
}

/// `[packager]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagerDecl {
    #[serde(default = "default_true")]
    pub asar: bool,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub arch: Option<Arch>,
    /// Keyed by platform identifier
    #[serde(default)]
    pub runtime: BTreeMap<String, RuntimeDecl>,
}

impl Default for PackagerDecl {
    fn default() -> Self {
        Self {
            asar: true,
            out_dir: None,
            platforms: Vec::new(),
            arch: None,
            runtime: BTreeMap::new(),
        }
    }
}

/// `[main]`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainDecl {
    #[serde(default)]
    pub script: Option<PathBuf>,
}

/// `[renderer]`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RendererDecl {
    #[serde(default)]
    pub layout: RendererLayout,
    #[serde(default)]
    pub entry_points: Vec<EntryPointDecl>,
}

/// The whole configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub package: PackageDecl,
    #[serde(default)]
    pub packager: PackagerDecl,
    #[serde(default)]
    pub main: MainDecl,
    #[serde(default)]
    pub renderer: RendererDecl,
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
    #[serde(default)]
    pub makers: Vec<MakerDecl>,
    #[serde(default)]
    pub hardening: HardeningDecl,
}

fn default_true() -> bool {
    true
}

impl ConfigFile {
    /// Parses configuration text.
    pub fn parse(text: &str) -> bundler::Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Validates the declarations into [`Settings`].
    ///
    /// `base` is the directory relative paths are resolved against.
    pub fn into_settings(self, base: &Path) -> bundler::Result<Settings> {
        let package = PackageSettings {
            name: self.package.name,
            product_name: self.package.product_name.unwrap_or_default(),
            version: self.package.version,
            description: self.package.description,
            executable_name: self.package.executable_name.unwrap_or_default(),
            authors: self.package.authors,
            homepage: self.package.homepage,
            license: self.package.license,
        };

        let mut runtimes = BTreeMap::new();
        for (key, decl) in self.packager.runtime {
            let platform: Platform = key
                .parse()
                .map_err(|e: String| Error::config(format!("[packager.runtime.{key}]: {e}")))?;
            let executable = decl
                .executable
                .unwrap_or_else(|| RuntimeSettings::default_executable(platform).to_string());
            runtimes.insert(
                platform,
                RuntimeSettings {
                    dir: decl.dir,
                    executable,
                },
            );
        }

        let defaults = PackagerSettings::default();
        let packager = PackagerSettings {
            asar: self.packager.asar,
            out_dir: self.packager.out_dir.unwrap_or(defaults.out_dir),
            platforms: self.packager.platforms,
            arch: self.packager.arch.unwrap_or(defaults.arch),
            runtimes,
        };

        let mut builder = SettingsBuilder::new()
            .project_dir(base)
            .package_settings(package)
            .packager_settings(packager)
            .layout(self.renderer.layout)
            .hardening(self.hardening.into());

        if let Some(script) = self.main.script {
            builder = builder.main_script(script);
        }
        for rule in &self.rules {
            builder = builder.rule(BundleRule::from_decl(rule)?);
        }
        for decl in self.renderer.entry_points {
            builder = builder.entry_point(EntryPoint::from_decl(decl, base)?);
        }
        for maker in self.makers {
            builder = builder.maker(DistributableTarget::from(maker));
        }

        builder.build()
    }
}

/// Reads and parses the configuration file at `path`.
///
/// Returns the parsed file and the directory relative paths resolve
/// against, so callers can apply overrides before validation.
pub fn load_config(path: &Path) -> bundler::Result<(ConfigFile, PathBuf)> {
    let path = path
        .absolutize()
        .map_err(|e| Error::config(format!("invalid config path {}: {e}", path.display())))?
        .into_owned();
    let text = std::fs::read_to_string(&path)
        .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
    let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let config = ConfigFile::parse(&text).map_err(|e| match e {
        Error::Configuration(reason) => Error::config(format!("{}: {reason}", path.display())),
        other => other,
    })?;
    log::debug!("loaded configuration from {}", path.display());
    Ok((config, base))
}

/// Reads and validates the configuration file at `path`.
///
/// # Errors
///
/// [`Error::Configuration`] for unreadable, malformed or inconsistent
/// configuration. Nothing is written to disk.
pub fn load_settings(path: &Path) -> bundler::Result<Settings> {
    let (config, base) = load_config(path)?;
    config.into_settings(&base)
}
