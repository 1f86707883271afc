//! Shared fixtures for generator and pipeline unit tests.

use crate::bundler::{
    EntryPoint, PackageSettings, PackagerSettings, Settings, SettingsBuilder,
    packager::PackagedApp,
    platform::MakeContext,
    settings::{Arch, Platform},
};
use std::{collections::BTreeMap, path::Path, sync::Arc};

/// Minimal valid settings rooted at `project`, output in `project/out`.
pub(crate) fn settings(project: &Path, authors: &[&str]) -> Settings {
    std::fs::write(project.join("main.js"), "module.exports = 0;").unwrap();
    SettingsBuilder::new()
        .project_dir(project)
        .package_settings(PackageSettings {
            name: "webgpu-demo".into(),
            product_name: "WebGPU Demo".into(),
            version: "1.2.0".into(),
            description: "WebGPU client in a desktop shell".into(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        })
        .packager_settings(PackagerSettings {
            out_dir: project.join("out"),
            ..Default::default()
        })
        .main_script(project.join("main.js"))
        .entry_point(EntryPoint::new("main_window", project.join("main.js")))
        .build()
        .unwrap()
}

/// A fake packaged tree with an executable and archived app content.
pub(crate) fn packaged_tree(settings: &Settings, platform: Platform, arch: Arch) -> PackagedApp {
    let root = settings
        .out_dir()
        .join(format!("webgpu-demo-{platform}-{arch}"));
    let resources = root.join("resources");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(resources.join("app.asar"), b"asar-bytes").unwrap();

    let executable = root.join(platform.executable_file_name("webgpu-demo"));
    std::fs::write(&executable, b"runtime").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    PackagedApp {
        platform,
        arch,
        root,
        resources_dir: resources,
        executable: Some(executable),
    }
}

/// Generator context over `settings` with the given metadata.
pub(crate) fn context(settings: Settings, metadata: &[(&str, &str)]) -> MakeContext {
    MakeContext {
        make_dir: settings.out_dir().join("make"),
        settings: Arc::new(settings),
        metadata: metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}
