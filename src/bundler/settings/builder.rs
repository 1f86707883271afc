//! Builder for constructing Settings.

use super::{
    DistributableTarget, EntryPoint, HardeningSettings, PackageSettings, PackagerSettings,
    Settings,
};
use crate::bundler::{
    error::{Error, Result},
    renderer::{BundleRule, RendererLayout, RendererStage, RuleSetBuilder},
    utils::fs::resolve_path,
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Builder for constructing [`Settings`].
///
/// Collects declarations in order and validates them all in [`build`],
/// before any build work can start.
///
/// [`build`]: SettingsBuilder::build
#[derive(Default)]
pub struct SettingsBuilder {
    project_dir: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    packager_settings: PackagerSettings,
    main_script: Option<PathBuf>,
    rules: RuleSetBuilder,
    entry_points: Vec<EntryPoint>,
    layout: RendererLayout,
    makers: Vec<DistributableTarget>,
    hardening: HardeningSettings,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the directory relative paths are resolved against.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets packaging options.
    ///
    /// Default: [`PackagerSettings::default`]
    pub fn packager_settings(mut self, settings: PackagerSettings) -> Self {
        self.packager_settings = settings;
        self
    }

    /// Sets the host main-process script.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn main_script<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.main_script = Some(path.as_ref().to_path_buf());
        self
    }

    /// Appends a bundle rule.
    pub fn rule(mut self, rule: BundleRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a renderer entry point; order is window registration order.
    pub fn entry_point(mut self, entry: EntryPoint) -> Self {
        self.entry_points.push(entry);
        self
    }

    /// Sets the renderer output layout.
    ///
    /// Default: [`RendererLayout::Scoped`]
    pub fn layout(mut self, layout: RendererLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Appends a distributable target.
    pub fn maker(mut self, target: DistributableTarget) -> Self {
        self.makers.push(target);
        self
    }

    /// Sets the hardening toggle set.
    ///
    /// Default: disabled
    pub fn hardening(mut self, hardening: HardeningSettings) -> Self {
        self.hardening = hardening;
        self
    }

    /// Builds and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a required field is missing, the
    /// version is not semver, the renderer declarations are inconsistent, or
    /// two enabled makers share a kind.
    pub fn build(self) -> Result<Settings> {
        let project_dir = self
            .project_dir
            .ok_or_else(|| Error::config("project directory is required"))?;
        let mut package = self
            .package_settings
            .ok_or_else(|| Error::config("[package] settings are required"))?;

        if package.name.trim().is_empty() {
            return Err(Error::config("package name cannot be empty"));
        }
        semver::Version::parse(&package.version).map_err(|e| {
            Error::config(format!("package version '{}' is not semver: {e}", package.version))
        })?;
        if package.product_name.is_empty() {
            package.product_name = package.name.clone();
        }
        if package.executable_name.is_empty() {
            package.executable_name = package.name.clone();
        }

        let main_script = self
            .main_script
            .map(|p| resolve_path(&project_dir, &p))
            .ok_or_else(|| Error::config("a main-process script ([main] script) is required"))?;

        let mut packager = self.packager_settings;
        packager.out_dir = resolve_path(&project_dir, &packager.out_dir);
        for runtime in packager.runtimes.values_mut() {
            runtime.dir = resolve_path(&project_dir, &runtime.dir);
        }

        let renderer = RendererStage::new(
            self.rules.snapshot(),
            self.entry_points,
            self.layout,
            project_dir.clone(),
        )?;

        let mut kinds = HashSet::new();
        for maker in self.makers.iter().filter(|m| m.enabled) {
            if !kinds.insert(maker.kind) {
                return Err(Error::config(format!(
                    "maker '{}' is enabled more than once",
                    maker.kind
                )));
            }
        }

        Ok(Settings::new(
            package,
            packager,
            project_dir,
            main_script,
            renderer,
            self.makers,
            self.hardening,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{Arch, BuildTargets, Fuse, MakerKind, Platform};

    fn package() -> PackageSettings {
        PackageSettings {
            name: "webgpu-demo".into(),
            version: "1.2.3".into(),
            ..Default::default()
        }
    }

    fn base() -> SettingsBuilder {
        SettingsBuilder::new()
            .project_dir("/project")
            .package_settings(package())
            .main_script("src/main.js")
            .entry_point(EntryPoint::new("main_window", "/project/src/renderer.js"))
    }

    #[test]
    fn fills_defaults_and_resolves_paths() {
        let settings = base().build().unwrap();
        assert_eq!(settings.product_name(), "webgpu-demo");
        assert_eq!(settings.package().executable_name, "webgpu-demo");
        assert_eq!(settings.main_script(), Path::new("/project/src/main.js"));
        assert_eq!(settings.out_dir(), Path::new("/project/out"));
    }

    #[test]
    fn rejects_non_semver_version() {
        let err = base()
            .package_settings(PackageSettings {
                version: "one".into(),
                ..package()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn requires_main_script_and_entry_points() {
        let err = SettingsBuilder::new()
            .project_dir("/project")
            .package_settings(package())
            .entry_point(EntryPoint::new("main_window", "/project/src/renderer.js"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("main-process script"));

        let err = SettingsBuilder::new()
            .project_dir("/project")
            .package_settings(package())
            .main_script("src/main.js")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("entry point"));
    }

    #[test]
    fn rejects_duplicate_enabled_makers() {
        let mut disabled = DistributableTarget::new(MakerKind::Zip);
        disabled.enabled = false;
        assert!(
            base()
                .maker(DistributableTarget::new(MakerKind::Zip))
                .maker(disabled)
                .build()
                .is_ok()
        );

        let err = base()
            .maker(DistributableTarget::new(MakerKind::Zip))
            .maker(DistributableTarget::new(MakerKind::Zip).with_platforms([Platform::Linux]))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn hardening_needs_a_runtime_per_target() {
        let settings = base()
            .hardening(HardeningSettings::enabled_with([(Fuse::RunAsHostRuntime, false)]))
            .build()
            .unwrap();
        let targets = BuildTargets::new([Platform::Linux], Arch::X64);
        let err = settings.validate_targets(&targets).unwrap_err();
        assert!(err.to_string().contains("no runtime is configured for linux"));
    }

    #[test]
    fn target_resolution_prefers_overrides() {
        let settings = base()
            .packager_settings(PackagerSettings {
                platforms: vec![Platform::Linux, Platform::Darwin],
                arch: Arch::Arm64,
                ..Default::default()
            })
            .build()
            .unwrap();

        let from_config = settings.build_targets(&[], None);
        assert_eq!(from_config.platforms, vec![Platform::Linux, Platform::Darwin]);
        assert_eq!(from_config.arch, Arch::Arm64);

        let overridden =
            settings.build_targets(&[Platform::Win32, Platform::Win32], Some(Arch::X64));
        assert_eq!(overridden, BuildTargets::new([Platform::Win32], Arch::X64));
    }
}
