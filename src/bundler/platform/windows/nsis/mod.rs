//! Windows NSIS installer creation.
//!
//! Creates per-user installers with NSIS (Nullsoft Scriptable Install
//! System). The packaged tree is installed under
//! `%LOCALAPPDATA%\Programs\<Product>` with Start menu and desktop shortcuts
//! and an uninstaller registered under the current user.
//!
//! # Module Organization
//!
//! - `template` - NSI script template constant
//! - `toolset` - makensis location
//! - `script` - NSI script generation from the template
//! - `build` - makensis execution
//! - `utils` - architecture mapping, version formatting, escaping

mod build;
mod script;
mod template;
mod toolset;
mod utils;

pub use script::uninstall_key;

use super::super::{Generator, MakeContext};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    packager::PackagedApp,
    settings::Platform,
    utils::fs::resolve_path,
};
use std::path::{Component, Path, PathBuf};

const RECOGNISED: &[&str] = &[
    "authors",
    "description",
    "setup_exe",
    "certificate_file",
    "certificate_password",
    "makensis",
];

/// Builds NSIS installers for win32 trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct NsisGenerator;

impl NsisGenerator {
    fn fail(&self, app: &PackagedApp, reason: impl Into<String>) -> Error {
        Error::Generator {
            generator: self.name().to_string(),
            platform: app.platform,
            reason: reason.into(),
        }
    }
}

impl Generator for NsisGenerator {
    fn name(&self) -> &str {
        "windows-installer"
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Win32]
    }

    fn recognised_metadata(&self) -> &[&str] {
        RECOGNISED
    }

    fn make(&self, app: &PackagedApp, ctx: &MakeContext) -> Result<Vec<PathBuf>> {
        ctx.log_ignored_keys(self);
        let settings = &ctx.settings;
        log::info!("Building NSIS installer for {}", settings.product_name());

        let installer_name = match ctx.meta("setup_exe") {
            Some(name) if is_plain_file_name(name) => name.to_string(),
            Some(name) => {
                return Err(self.fail(
                    app,
                    format!("setup_exe '{name}' must be a file name without directories"),
                ));
            }
            None => format!(
                "{}-{} Setup.exe",
                settings.product_name(),
                settings.version_string()
            ),
        };

        let tool = ctx.meta("makensis").unwrap_or("makensis");
        let makensis = toolset::locate_makensis(tool).map_err(|e| self.fail(app, e.to_string()))?;

        if let Some(certificate) = ctx.meta("certificate_file") {
            let path = resolve_path(settings.project_dir(), Path::new(certificate));
            if !path.is_file() {
                return Err(self.fail(
                    app,
                    format!("certificate file {} does not exist", path.display()),
                ));
            }
            log::warn!(
                "certificate {} configured; installer signing is not performed",
                path.display()
            );
        }

        let arch = utils::map_arch(app.arch).map_err(|e| self.fail(app, e.to_string()))?;
        let executable = app
            .executable
            .as_ref()
            .and_then(|e| e.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| {
                Platform::Win32.executable_file_name(&settings.package().executable_name)
            });

        let output_dir = ctx.make_dir.join("nsis").join(app.arch.as_str());
        std::fs::create_dir_all(&output_dir).fs_context("creating NSIS output directory", &output_dir)?;
        log::debug!("NSIS target architecture: {arch}");

        let nsi_path = script::generate_nsi_script(app, ctx, &executable, &output_dir)?;

        let installer_path = output_dir.join(installer_name);

        build::run_makensis(&makensis, &nsi_path, &installer_path)
            .map_err(|e| self.fail(app, e.to_string()))?;

        log::info!("✓ Created NSIS installer: {}", installer_path.display());
        Ok(vec![installer_path])
    }
}

fn is_plain_file_name(name: &str) -> bool {
    // Backslash separates directories on the target even when building elsewhere
    if name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{settings::Arch, test_support};

    #[test]
    fn script_installs_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_support::settings(dir.path(), &["Armchair Software"]);
        let app = test_support::packaged_tree(&settings, Platform::Win32, Arch::X64);
        let ctx = test_support::context(settings, &[("description", "A \"fast\" client")]);

        let script = script::render_nsi_script(&app, &ctx, "webgpu-demo.exe").unwrap();
        assert!(script.contains("RequestExecutionLevel user"));
        assert!(script.contains("InstallDir \"$LOCALAPPDATA\\Programs\\WebGPU Demo\""));
        assert!(script.contains("!define PUBLISHER \"Armchair Software\""));
        assert!(script.contains("VIProductVersion \"1.2.0.0\""));
        assert!(script.contains("A $\\\"fast$\\\" client"));
        assert!(script.contains(&uninstall_key("webgpu-demo")));
        assert!(script.contains(&format!("File /r \"{}/*\"", app.root.display())));
    }

    #[test]
    fn uninstall_key_is_stable() {
        assert_eq!(uninstall_key("webgpu-demo"), uninstall_key("webgpu-demo"));
        assert_ne!(uninstall_key("webgpu-demo"), uninstall_key("other"));
        assert!(uninstall_key("webgpu-demo").starts_with('{'));
    }

    #[test]
    fn missing_toolchain_is_a_generator_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_support::settings(dir.path(), &[]);
        let app = test_support::packaged_tree(&settings, Platform::Win32, Arch::X64);
        let ctx = test_support::context(settings, &[("makensis", "makensis-that-does-not-exist")]);

        match NsisGenerator.make(&app, &ctx).unwrap_err() {
            Error::Generator { generator, reason, .. } => {
                assert_eq!(generator, "windows-installer");
                assert!(reason.contains("makensis-that-does-not-exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn declared_certificate_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_makensis(dir.path());
        let settings = test_support::settings(dir.path(), &[]);
        let app = test_support::packaged_tree(&settings, Platform::Win32, Arch::X64);
        let ctx = test_support::context(
            settings,
            &[
                ("makensis", tool.to_str().unwrap()),
                ("certificate_file", "./cert.pfx"),
            ],
        );

        let err = NsisGenerator.make(&app, &ctx).unwrap_err();
        assert!(err.to_string().contains("cert.pfx"));
    }

    #[test]
    fn setup_exe_must_stay_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_support::settings(dir.path(), &[]);
        let app = test_support::packaged_tree(&settings, Platform::Win32, Arch::X64);
        for name in ["../../Setup.exe", "sub/Setup.exe", "..\\Setup.exe", "/tmp/Setup.exe", ".."] {
            let ctx = test_support::context(settings.clone(), &[("setup_exe", name)]);
            match NsisGenerator.make(&app, &ctx).unwrap_err() {
                Error::Generator { reason, .. } => assert!(reason.contains("setup_exe"), "{name}"),
                other => panic!("unexpected error for {name}: {other}"),
            }
        }
        assert!(!dir.path().join("out/make/nsis").exists());
    }

    #[cfg(unix)]
    fn fake_makensis(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let tool = dir.join("fake-makensis");
        std::fs::write(
            &tool,
            "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    -DOUTPUT_FILE=*) printf MZ > \"${arg#-DOUTPUT_FILE=}\" ;;\n  esac\ndone\n",
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        tool
    }

    #[cfg(unix)]
    #[test]
    fn compiles_installer_with_makensis() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_makensis(dir.path());
        let settings = test_support::settings(dir.path(), &[]);
        let app = test_support::packaged_tree(&settings, Platform::Win32, Arch::X64);
        let ctx = test_support::context(settings, &[("makensis", tool.to_str().unwrap())]);

        let outputs = NsisGenerator.make(&app, &ctx).unwrap();
        assert_eq!(
            outputs,
            vec![dir.path().join("out/make/nsis/x64/WebGPU Demo-1.2.0 Setup.exe")]
        );
        assert_eq!(std::fs::read(&outputs[0]).unwrap(), b"MZ");
        assert!(dir.path().join("out/make/nsis/x64/installer.nsi").is_file());
    }
}
