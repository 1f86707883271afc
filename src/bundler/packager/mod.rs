//! Packaged app trees.
//!
//! Turns the staged app directory (`package.json` plus `.webpack/`) into one
//! launchable tree per target platform under `out/<name>-<platform>-<arch>/`.

pub mod asar;

use crate::{
    bail,
    bundler::{
        error::{Error, ErrorExt, Result},
        settings::{Arch, Platform, RuntimeSettings, Settings},
        utils::fs,
    },
};
use serde_json::json;
use std::path::{Path, PathBuf};

/// A finished, read-only packaged tree for one platform.
#[derive(Clone, Debug)]
pub struct PackagedApp {
    /// Platform the tree targets
    pub platform: Platform,
    /// Architecture the tree targets
    pub arch: Arch,
    /// Tree root, `out/<name>-<platform>-<arch>`
    pub root: PathBuf,
    /// Directory holding the app content
    pub resources_dir: PathBuf,
    /// Renamed host executable, when a runtime was configured
    pub executable: Option<PathBuf>,
}

impl PackagedApp {
    /// Directory name of the tree root.
    pub fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path of the app content inside the tree.
    pub fn app_path(&self, asar: bool) -> PathBuf {
        self.resources_dir
            .join(if asar { "app.asar" } else { "app" })
    }
}

/// Writes the generated `package.json` into the staged app directory.
pub async fn write_package_json(settings: &Settings, app_dir: &Path) -> Result<()> {
    let package = settings.package();
    let manifest = json!({
        "name": package.name,
        "productName": package.product_name,
        "version": package.version,
        "description": package.description,
        "author": package.primary_author(),
        "homepage": package.homepage,
        "license": package.license,
        "main": ".webpack/main/index.js",
    });
    let body = serde_json::to_string_pretty(&manifest)?;
    fs::write_file(&app_dir.join("package.json"), body).await
}

/// Copies the runtime into `root` and renames its executable.
///
/// Returns the resources directory and the executable path.
async fn install_runtime(
    settings: &Settings,
    platform: Platform,
    runtime: &RuntimeSettings,
    root: &Path,
) -> Result<(PathBuf, PathBuf)> {
    fs::copy_dir(&runtime.dir, root).await?;
    let executable_name = &settings.package().executable_name;

    match platform {
        Platform::Darwin => {
            let original = root.join(format!("{}.app", runtime.executable));
            let bundle = root.join(format!("{}.app", settings.product_name()));
            if !original.is_dir() {
                bail!("runtime app bundle {} not found", original.display());
            }
            if original != bundle {
                tokio::fs::rename(&original, &bundle)
                    .await
                    .fs_context("renaming app bundle", &original)?;
            }
            let macos = bundle.join("Contents/MacOS");
            let executable = macos.join(settings.product_name());
            let runtime_exe = macos.join(&runtime.executable);
            if runtime_exe != executable {
                tokio::fs::rename(&runtime_exe, &executable)
                    .await
                    .fs_context("renaming runtime executable", &runtime_exe)?;
            }
            Ok((bundle.join("Contents/Resources"), executable))
        }
        Platform::Linux | Platform::Win32 => {
            let runtime_exe = root.join(platform.executable_file_name(&runtime.executable));
            let executable = root.join(platform.executable_file_name(executable_name));
            if !runtime_exe.is_file() {
                bail!("runtime executable {} not found", runtime_exe.display());
            }
            if runtime_exe != executable {
                tokio::fs::rename(&runtime_exe, &executable)
                    .await
                    .fs_context("renaming runtime executable", &runtime_exe)?;
            }
            Ok((root.join("resources"), executable))
        }
    }
}

/// Builds the packaged tree for `platform` from the staged `app_dir`.
///
/// The tree root is erased first. Without a configured runtime only the
/// resources directory is produced.
pub async fn package_platform(
    settings: &Settings,
    app_dir: &Path,
    platform: Platform,
    arch: Arch,
) -> Result<PackagedApp> {
    let root = settings.out_dir().join(format!(
        "{}-{}-{}",
        settings.package().name,
        platform,
        arch
    ));
    fs::create_dir_all(&root, true).await?;

    let (resources_dir, executable) = match settings.packager().runtimes.get(&platform) {
        Some(runtime) => {
            let (resources, exe) = install_runtime(settings, platform, runtime, &root).await?;
            (resources, Some(exe))
        }
        None => {
            log::warn!("no runtime configured for {platform}; packaging app content only");
            let resources = match platform {
                Platform::Darwin => root
                    .join(format!("{}.app", settings.product_name()))
                    .join("Contents/Resources"),
                _ => root.join("resources"),
            };
            (resources, None)
        }
    };
    fs::create_dir_all(&resources_dir, false).await?;

    // The runtime's placeholder app must not shadow ours
    let default_app = resources_dir.join("default_app.asar");
    if default_app.exists() {
        tokio::fs::remove_file(&default_app)
            .await
            .fs_context("removing default app", &default_app)?;
    }

    let app = PackagedApp {
        platform,
        arch,
        root,
        resources_dir,
        executable,
    };

    let target = app.app_path(settings.packager().asar);
    if settings.packager().asar {
        let src = app_dir.to_path_buf();
        let dest = target.clone();
        let summary = tokio::task::spawn_blocking(move || asar::pack(&src, &dest))
            .await
            .map_err(|e| Error::GenericError(format!("archive task panicked: {e}")))??;
        log::debug!(
            "wrote {} ({} files, header {})",
            summary.path.display(),
            summary.files,
            summary.header_hash
        );
    } else {
        fs::copy_dir(app_dir, &target).await?;
    }

    log::info!("packaged {} at {}", platform, app.root.display());
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        EntryPoint, PackageSettings, PackagerSettings, SettingsBuilder,
    };
    use std::collections::BTreeMap;

    fn settings(project: &Path, asar: bool, runtimes: BTreeMap<Platform, RuntimeSettings>) -> Settings {
        std::fs::write(project.join("main.js"), "module.exports = 0;").unwrap();
        std::fs::write(project.join("renderer.js"), "module.exports = 0;").unwrap();
        SettingsBuilder::new()
            .project_dir(project)
            .package_settings(PackageSettings {
                name: "webgpu-demo".into(),
                product_name: "WebGPU Demo".into(),
                version: "1.0.0".into(),
                authors: vec!["Armchair Software".into()],
                ..Default::default()
            })
            .packager_settings(PackagerSettings {
                asar,
                out_dir: project.join("out"),
                runtimes,
                ..Default::default()
            })
            .main_script(project.join("main.js"))
            .entry_point(EntryPoint::new("main_window", project.join("renderer.js")))
            .build()
            .unwrap()
    }

    fn staged_app(dir: &Path) -> PathBuf {
        let app = dir.join("stage");
        std::fs::create_dir_all(app.join(".webpack/main")).unwrap();
        std::fs::write(app.join(".webpack/main/index.js"), "main").unwrap();
        std::fs::write(app.join("package.json"), "{}").unwrap();
        app
    }

    #[tokio::test]
    async fn linux_runtime_is_renamed_and_content_archived() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().join("runtime-linux");
        std::fs::create_dir_all(runtime_dir.join("resources")).unwrap();
        std::fs::write(runtime_dir.join("electron"), b"ELF").unwrap();
        std::fs::write(runtime_dir.join("resources/default_app.asar"), b"x").unwrap();
        std::fs::write(runtime_dir.join("libffmpeg.so"), b"lib").unwrap();

        let runtimes = BTreeMap::from([(
            Platform::Linux,
            RuntimeSettings {
                dir: runtime_dir,
                executable: "electron".into(),
            },
        )]);
        let settings = settings(dir.path(), true, runtimes);
        let app = package_platform(&settings, &staged_app(dir.path()), Platform::Linux, Arch::X64)
            .await
            .unwrap();

        assert_eq!(app.dir_name(), "webgpu-demo-linux-x64");
        assert_eq!(app.executable.as_deref(), Some(app.root.join("webgpu-demo").as_path()));
        assert!(app.root.join("webgpu-demo").is_file());
        assert!(!app.root.join("electron").exists());
        assert!(app.root.join("libffmpeg.so").is_file());
        assert!(!app.resources_dir.join("default_app.asar").exists());

        let archive = asar::Archive::open(&app.resources_dir.join("app.asar")).unwrap();
        assert_eq!(archive.read(".webpack/main/index.js").unwrap(), b"main");
    }

    #[tokio::test]
    async fn win32_without_runtime_copies_app_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), false, BTreeMap::new());
        let app = package_platform(&settings, &staged_app(dir.path()), Platform::Win32, Arch::X64)
            .await
            .unwrap();

        assert!(app.executable.is_none());
        assert!(app.root.join("resources/app/package.json").is_file());
        assert!(app.root.join("resources/app/.webpack/main/index.js").is_file());
    }

    #[tokio::test]
    async fn darwin_bundle_takes_product_name() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().join("runtime-darwin");
        std::fs::create_dir_all(runtime_dir.join("Electron.app/Contents/MacOS")).unwrap();
        std::fs::create_dir_all(runtime_dir.join("Electron.app/Contents/Resources")).unwrap();
        std::fs::write(runtime_dir.join("Electron.app/Contents/MacOS/Electron"), b"MACHO").unwrap();

        let runtimes = BTreeMap::from([(
            Platform::Darwin,
            RuntimeSettings {
                dir: runtime_dir,
                executable: "Electron".into(),
            },
        )]);
        let settings = settings(dir.path(), true, runtimes);
        let app = package_platform(&settings, &staged_app(dir.path()), Platform::Darwin, Arch::Arm64)
            .await
            .unwrap();

        let bundle = app.root.join("WebGPU Demo.app");
        assert!(bundle.join("Contents/MacOS/WebGPU Demo").is_file());
        assert!(bundle.join("Contents/Resources/app.asar").is_file());
        assert_eq!(app.resources_dir, bundle.join("Contents/Resources"));
    }

    #[tokio::test]
    async fn missing_runtime_executable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().join("runtime");
        std::fs::create_dir_all(&runtime_dir).unwrap();
        let runtimes = BTreeMap::from([(
            Platform::Linux,
            RuntimeSettings {
                dir: runtime_dir,
                executable: "electron".into(),
            },
        )]);
        let settings = settings(dir.path(), true, runtimes);
        let err = package_platform(&settings, &staged_app(dir.path()), Platform::Linux, Arch::X64)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("runtime executable"));
    }

    #[tokio::test]
    async fn package_json_names_main_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), true, BTreeMap::new());
        let app_dir = dir.path().join("stage");
        write_package_json(&settings, &app_dir).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(app_dir.join("package.json")).unwrap()).unwrap();
        assert_eq!(value["main"], ".webpack/main/index.js");
        assert_eq!(value["productName"], "WebGPU Demo");
        assert_eq!(value["author"], "Armchair Software");
    }
}
