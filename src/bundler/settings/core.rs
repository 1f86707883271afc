//! Core Settings struct and implementations.

use super::{
    Arch, DistributableTarget, HardeningSettings, PackageSettings, PackagerSettings, Platform,
};
use crate::bundler::{
    error::{Error, Result},
    renderer::RendererStage,
};
use std::path::{Path, PathBuf};

/// Platforms and architecture a single build produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTargets {
    /// Target platforms, deduplicated, in request order.
    pub platforms: Vec<Platform>,
    /// Target architecture.
    pub arch: Arch,
}

impl BuildTargets {
    /// Creates targets, dropping repeated platforms.
    pub fn new(platforms: impl IntoIterator<Item = Platform>, arch: Arch) -> Self {
        let mut unique = Vec::new();
        for platform in platforms {
            if !unique.contains(&platform) {
                unique.push(platform);
            }
        }
        Self {
            platforms: unique,
            arch,
        }
    }
}

/// Validated configuration for one project.
///
/// Built by [`SettingsBuilder`](super::SettingsBuilder); every path is
/// absolute and every cross-field rule has been checked.
///
/// # Examples
///
/// ```no_run
/// use appshell_bundler::bundler::{
///     EntryPoint, PackageSettings, RendererLayout, SettingsBuilder,
/// };
///
/// # fn example() -> appshell_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_dir("/work/webgpu-demo")
///     .package_settings(PackageSettings {
///         name: "webgpu-demo".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .main_script("/work/webgpu-demo/src/main.js")
///     .entry_point(EntryPoint::new("main_window", "/work/webgpu-demo/src/renderer.js"))
///     .layout(RendererLayout::Scoped)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package metadata.
    package: PackageSettings,

    /// Global packaging options.
    packager: PackagerSettings,

    /// Directory configuration paths are resolved against.
    project_dir: PathBuf,

    /// Host main-process script.
    main_script: PathBuf,

    /// Renderer stage with its frozen rule set.
    renderer: RendererStage,

    /// Distributable targets in declaration order.
    makers: Vec<DistributableTarget>,

    /// Hardening toggle set.
    hardening: HardeningSettings,
}

impl Settings {
    /// Returns the package metadata.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the package description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// Returns the packaging options.
    pub fn packager(&self) -> &PackagerSettings {
        &self.packager
    }

    /// Returns the project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the root of all build output.
    pub fn out_dir(&self) -> &Path {
        &self.packager.out_dir
    }

    /// Returns the main-process script.
    pub fn main_script(&self) -> &Path {
        &self.main_script
    }

    /// Returns the renderer stage.
    pub fn renderer(&self) -> &RendererStage {
        &self.renderer
    }

    /// Returns the distributable targets.
    pub fn makers(&self) -> &[DistributableTarget] {
        &self.makers
    }

    /// Returns the hardening toggle set.
    pub fn hardening(&self) -> &HardeningSettings {
        &self.hardening
    }

    /// Resolves build targets from overrides, configuration, then the host.
    pub fn build_targets(&self, platforms: &[Platform], arch: Option<Arch>) -> BuildTargets {
        let platforms = if !platforms.is_empty() {
            platforms.to_vec()
        } else if !self.packager.platforms.is_empty() {
            self.packager.platforms.clone()
        } else {
            vec![Platform::current()]
        };
        BuildTargets::new(platforms, arch.unwrap_or(self.packager.arch))
    }

    /// Checks rules that depend on the chosen targets.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when there are no targets, or hardening is
    /// enabled for a platform without a runtime binary to patch.
    pub fn validate_targets(&self, targets: &BuildTargets) -> Result<()> {
        if targets.platforms.is_empty() {
            return Err(Error::config("no target platforms selected"));
        }
        if self.hardening.is_active() {
            for platform in &targets.platforms {
                if !self.packager.runtimes.contains_key(platform) {
                    return Err(Error::config(format!(
                        "hardening is enabled but no runtime is configured for {platform}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        package: PackageSettings,
        packager: PackagerSettings,
        project_dir: PathBuf,
        main_script: PathBuf,
        renderer: RendererStage,
        makers: Vec<DistributableTarget>,
        hardening: HardeningSettings,
    ) -> Self {
        Self {
            package,
            packager,
            project_dir,
            main_script,
            renderer,
            makers,
            hardening,
        }
    }
}
