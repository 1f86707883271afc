//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that drives the
//! renderer stage, packages one tree per target platform, applies the
//! hardening toggle set and fans out to the distributable generators.

use super::{
    checksum::calculate_sha256,
    report::{Artifact, Failure, MakeReport, Skipped},
};
use crate::bundler::{
    BuildTargets, Result, Settings,
    error::{Error, ErrorExt},
    hardening,
    packager::{self, PackagedApp},
    platform::{Generator, MakeContext, generator_for},
    renderer::{RendererOutput, Transformer},
    settings::{DistributableTarget, EntryPoint, Platform},
    utils::fs,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task::JoinSet;

/// Directory under the output root where the app content is staged.
const STAGE_DIR: &str = ".app";

/// Packaged trees and the renderer output they were built from.
#[derive(Clone, Debug)]
pub struct PackageOutput {
    /// Renderer stage output inside the staged app
    pub renderer: RendererOutput,
    /// Main-process bundle
    pub main_bundle: PathBuf,
    /// One tree per target platform, in target order
    pub apps: Vec<PackagedApp>,
}

/// Main bundler orchestrator.
///
/// Owns the validated [`Settings`] and one resolved generator per enabled
/// distributable target.
///
/// # Examples
///
/// ```no_run
/// use appshell_bundler::bundler::{Bundler, Platform, Settings};
///
/// # async fn example(settings: Settings) -> appshell_bundler::bundler::Result<()> {
/// let bundler = Bundler::new(settings);
/// let targets = bundler.settings().build_targets(&[Platform::Linux, Platform::Win32], None);
/// let report = bundler.make(&targets).await?;
///
/// for artifact in &report.artifacts {
///     println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
///     println!("SHA256: {}", artifact.sha256);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Bundler {
    settings: Arc<Settings>,
    generators: Vec<(DistributableTarget, Arc<dyn Generator>)>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field(
                "generators",
                &self
                    .generators
                    .iter()
                    .map(|(_, g)| g.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Bundler {
    /// Creates a bundler, resolving a generator for every maker.
    pub fn new(settings: Settings) -> Self {
        let generators = settings
            .makers()
            .iter()
            .map(|target| (target.clone(), generator_for(target.kind)))
            .collect();
        Self {
            settings: Arc::new(settings),
            generators,
        }
    }

    /// Adds a target served by a custom generator.
    pub fn with_generator(mut self, target: DistributableTarget, generator: Arc<dyn Generator>) -> Self {
        self.generators.push((target, generator));
        self
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory the app content is staged in before packaging.
    pub fn stage_dir(&self) -> PathBuf {
        self.settings.out_dir().join(STAGE_DIR)
    }

    /// Runs everything up to and including the packaged trees.
    ///
    /// # Errors
    ///
    /// Every error here is fatal: configuration problems are reported before
    /// anything is written; transform and missing-asset errors stop the
    /// renderer stage; hardening errors stop after packaging.
    pub async fn package(&self, targets: &BuildTargets) -> Result<PackageOutput> {
        self.settings.validate_targets(targets)?;

        let stage = self.stage_dir();
        fs::create_dir_all(&stage, true).await?;

        let webpack = stage.join(".webpack");
        let renderer = self.settings.renderer().run(&webpack.join("renderer")).await?;
        let main_bundle = self.bundle_main(&webpack, &renderer).await?;
        packager::write_package_json(&self.settings, &stage).await?;

        let mut apps = Vec::with_capacity(targets.platforms.len());
        for platform in &targets.platforms {
            let app = packager::package_platform(&self.settings, &stage, *platform, targets.arch).await?;
            self.harden(&app).await?;
            apps.push(app);
        }

        Ok(PackageOutput {
            renderer,
            main_bundle,
            apps,
        })
    }

    /// Packages, then runs every applicable generator.
    ///
    /// Generator failures are collected into the report; only packaging
    /// errors are returned as `Err`.
    pub async fn make(&self, targets: &BuildTargets) -> Result<MakeReport> {
        let packaged = self.package(targets).await?;
        self.make_packaged(targets, &packaged.apps).await
    }

    /// Runs the generators over already packaged trees and writes
    /// `make/report.json`.
    pub async fn make_packaged(&self, targets: &BuildTargets, apps: &[PackagedApp]) -> Result<MakeReport> {
        let make_dir = self.settings.out_dir().join("make");
        fs::create_dir_all(&make_dir, false).await?;

        let mut skipped = Vec::new();
        let mut tasks = JoinSet::new();
        let mut order = 0usize;

        for (target, generator) in &self.generators {
            let effective =
                target.effective_platforms(&targets.platforms, generator.supported_platforms());

            for platform in &targets.platforms {
                if effective.contains(platform) {
                    continue;
                }
                let reason = if !target.enabled {
                    "disabled"
                } else if !target.admits(*platform) {
                    "excluded by platform filter"
                } else {
                    "platform not supported by generator"
                };
                log::debug!("skipping {} for {}: {}", generator.name(), platform, reason);
                skipped.push(Skipped {
                    generator: generator.name().to_string(),
                    platform: *platform,
                    reason: reason.to_string(),
                });
            }

            for platform in effective {
                let Some(app) = apps.iter().find(|a| a.platform == platform).cloned() else {
                    skipped.push(Skipped {
                        generator: generator.name().to_string(),
                        platform,
                        reason: "no packaged tree".to_string(),
                    });
                    continue;
                };
                let ctx = MakeContext {
                    settings: Arc::clone(&self.settings),
                    metadata: target.metadata.clone(),
                    make_dir: make_dir.clone(),
                };
                let generator = Arc::clone(generator);
                let index = order;
                order += 1;

                log::info!("Running {} for {}", generator.name(), platform);
                tasks.spawn_blocking(move || {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        generator.make(&app, &ctx)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(Error::Generator {
                            generator: generator.name().to_string(),
                            platform,
                            reason: format!("generator panicked: {}", panic_message(payload.as_ref())),
                        })
                    });
                    (index, generator.name().to_string(), platform, app.arch, result)
                });
            }
        }

        let mut results = Vec::with_capacity(order);
        while let Some(joined) = tasks.join_next().await {
            let done = joined.map_err(|e| Error::GenericError(format!("generator task panicked: {e}")))?;
            results.push(done);
        }
        results.sort_by_key(|(index, ..)| *index);

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        for (_, generator, platform, arch, result) in results {
            match result {
                Ok(paths) => {
                    for path in paths {
                        artifacts.push(describe_artifact(&generator, platform, &arch.to_string(), path).await?);
                    }
                }
                Err(e) => {
                    let error = match e {
                        Error::Generator { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    log::error!("{generator} failed for {platform}: {error}");
                    failures.push(Failure {
                        generator,
                        platform,
                        error,
                    });
                }
            }
        }

        let report = MakeReport {
            generated_at: chrono::Utc::now(),
            product_name: self.settings.product_name().to_string(),
            version: self.settings.version_string().to_string(),
            artifacts,
            skipped,
            failures,
        };
        report.write(&make_dir.join("report.json")).await?;
        Ok(report)
    }

    /// Bundles the main-process script with the entry constants prelude.
    async fn bundle_main(&self, webpack: &Path, renderer: &RendererOutput) -> Result<PathBuf> {
        let prelude = entry_constants(webpack, self.settings.renderer().entry_points(), renderer);
        let rules = self.settings.renderer().rules().clone();
        let project_dir = self.settings.project_dir().to_path_buf();
        let script = self.settings.main_script().to_path_buf();

        let bundle = tokio::task::spawn_blocking(move || {
            Transformer::new(&rules, &project_dir, "main").bundle(&script, &prelude)
        })
        .await
        .map_err(|e| Error::GenericError(format!("transform task panicked: {e}")))??;

        let target = webpack.join("main/index.js");
        fs::write_file(&target, &bundle.code).await?;
        log::info!("✓ Main bundle: {} module(s)", bundle.modules.len());
        Ok(target)
    }

    async fn harden(&self, app: &PackagedApp) -> Result<()> {
        let hardening = self.settings.hardening();
        if !hardening.is_active() {
            return Ok(());
        }
        let binary = app.executable.as_ref().ok_or_else(|| Error::Hardening {
            binary: app.root.clone(),
            reason: format!("no runtime executable in the {} tree", app.platform),
        })?;
        let changed = hardening::apply(binary, hardening).await?;
        log::info!("✓ Hardening: {} flag(s) changed in {}", changed, binary.display());
        Ok(())
    }
}

/// `<NAME>_WEBPACK_ENTRY` and `<NAME>_PRELOAD_WEBPACK_ENTRY` declarations.
///
/// Paths are relative to the main bundle's directory, so they hold wherever
/// the app content ends up.
fn entry_constants(webpack: &Path, entry_points: &[EntryPoint], renderer: &RendererOutput) -> String {
    let from_main = |path: &Path| {
        let relative = path.strip_prefix(webpack).unwrap_or(path);
        let relative = crate::bundler::platform::archive_path(relative);
        format!("require(\"path\").join(__dirname, {})", js_string(&format!("../{relative}")))
    };

    let mut prelude = String::new();
    for (entry, output) in entry_points.iter().zip(&renderer.entries) {
        let prefix = entry.constant_prefix();
        let document = output.html.as_deref().unwrap_or(&output.main_bundle);
        prelude.push_str(&format!(
            "const {prefix}_WEBPACK_ENTRY = require(\"url\").pathToFileURL({}).href;\n",
            from_main(document)
        ));
        if let Some(preload) = &output.preload_bundle {
            prelude.push_str(&format!(
                "const {prefix}_PRELOAD_WEBPACK_ENTRY = {};\n",
                from_main(preload)
            ));
        }
    }
    prelude
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

async fn describe_artifact(generator: &str, platform: Platform, arch: &str, path: PathBuf) -> Result<Artifact> {
    let size = tokio::fs::metadata(&path)
        .await
        .fs_context("reading artifact metadata", &path)?
        .len();
    let sha256 = calculate_sha256(&path).await?;
    log::info!("✓ {} [{}]: {}", generator, platform, path.display());
    Ok(Artifact {
        generator: generator.to_string(),
        platform,
        arch: arch.to_string(),
        path,
        size,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::renderer::EntryOutput;

    #[test]
    fn entry_constants_point_into_renderer_tree() {
        let webpack = PathBuf::from("/out/.app/.webpack");
        let renderer = RendererOutput {
            root: webpack.join("renderer"),
            entries: vec![EntryOutput {
                name: "main_window".into(),
                dir: webpack.join("renderer/main_window"),
                html: Some(webpack.join("renderer/main_window/index.html")),
                main_bundle: webpack.join("renderer/main_window/renderer.js"),
                preload_bundle: Some(webpack.join("renderer/main_window/preload.js")),
                assets: vec![],
            }],
        };

        let entries = [EntryPoint::new("main_window", "/project/src/renderer.js")];
        let prelude = entry_constants(&webpack, &entries, &renderer);
        assert_eq!(
            prelude,
            "const MAIN_WINDOW_WEBPACK_ENTRY = require(\"url\").pathToFileURL(require(\"path\").join(__dirname, \"../renderer/main_window/index.html\")).href;\n\
             const MAIN_WINDOW_PRELOAD_WEBPACK_ENTRY = require(\"path\").join(__dirname, \"../renderer/main_window/preload.js\");\n"
        );
    }
}
