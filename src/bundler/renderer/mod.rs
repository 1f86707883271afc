//! Renderer packaging stage.
//!
//! One stage owns a frozen [`RuleSet`] and the ordered entry points. For each
//! entry point it first runs the transform pipeline over the main and preload
//! scripts, then applies the entry's [`AssetManifest`] on top of the result.
//! The asset copy only starts once the transform output is on disk, so copied
//! assets are never overwritten by generated bundles.
//!
//! # Layout
//!
//! [`RendererLayout::Scoped`] places each entry under `<root>/<window name>/`;
//! [`RendererLayout::Flat`] writes the single entry point directly into
//! `<root>/`.

mod assets;
mod rules;
mod transform;

pub use assets::{AssetDecl, AssetEntry, AssetManifest};
pub use rules::{BundleRule, Handler, RuleDecl, RuleSet, RuleSetBuilder};
pub use transform::{Bundle, Transformer, inject_script};

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::{EntryPoint, validate_name},
    utils::fs,
};
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Output directory layout for renderer entry points.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererLayout {
    /// `<root>/<window name>/...`
    #[default]
    Scoped,
    /// `<root>/...`, single entry point only
    Flat,
}

/// Files produced for one entry point.
#[derive(Clone, Debug)]
pub struct EntryOutput {
    /// Window name
    pub name: String,
    /// Directory holding this entry's files
    pub dir: PathBuf,
    /// Generated document, when the entry declares one
    pub html: Option<PathBuf>,
    /// Main script bundle
    pub main_bundle: PathBuf,
    /// Preload bundle
    pub preload_bundle: Option<PathBuf>,
    /// Copied assets in application order
    pub assets: Vec<PathBuf>,
}

/// Result of a stage run.
#[derive(Clone, Debug)]
pub struct RendererOutput {
    /// Stage root
    pub root: PathBuf,
    /// Per-entry output in registration order
    pub entries: Vec<EntryOutput>,
}

/// Bundles every entry point and places its assets.
#[derive(Clone, Debug)]
pub struct RendererStage {
    rules: RuleSet,
    entry_points: Arc<[EntryPoint]>,
    layout: RendererLayout,
    project_root: PathBuf,
}

impl RendererStage {
    /// Creates a stage from a rule snapshot and entry points.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when there are no entry points, a name is not a
    /// valid window name, two names map to the same generated constant, or the
    /// flat layout is used with more than one entry point.
    pub fn new(
        rules: RuleSet,
        entry_points: Vec<EntryPoint>,
        layout: RendererLayout,
        project_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        if entry_points.is_empty() {
            return Err(Error::config("at least one renderer entry point is required"));
        }
        let mut names = HashSet::new();
        let mut prefixes = HashMap::new();
        for entry in &entry_points {
            validate_name(entry.name())?;
            if !names.insert(entry.name()) {
                return Err(Error::config(format!(
                    "entry point '{}' is declared more than once",
                    entry.name()
                )));
            }
            if let Some(other) = prefixes.insert(entry.constant_prefix(), entry.name()) {
                return Err(Error::config(format!(
                    "entry points '{other}' and '{}' both generate {}_WEBPACK_ENTRY",
                    entry.name(),
                    entry.constant_prefix()
                )));
            }
        }
        if layout == RendererLayout::Flat && entry_points.len() > 1 {
            return Err(Error::config(format!(
                "flat renderer layout supports a single entry point, found {}",
                entry_points.len()
            )));
        }

        Ok(Self {
            rules,
            entry_points: entry_points.into(),
            layout,
            project_root: project_root.into(),
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    pub fn layout(&self) -> RendererLayout {
        self.layout
    }

    /// Directory an entry point's files land in, relative to the stage root.
    pub fn relative_dir(&self, entry: &EntryPoint) -> PathBuf {
        match self.layout {
            RendererLayout::Scoped => PathBuf::from(entry.name()),
            RendererLayout::Flat => PathBuf::new(),
        }
    }

    /// Runs the stage into `root`, replacing anything already there.
    pub async fn run(&self, root: &Path) -> Result<RendererOutput> {
        fs::create_dir_all(root, true).await?;

        let mut entries = Vec::with_capacity(self.entry_points.len());
        for entry in self.entry_points.iter() {
            let dir = root.join(self.relative_dir(entry));
            log::info!("Bundling renderer entry point '{}'", entry.name());

            let mut output = self.transform_entry(entry, &dir).await?;
            output.assets = entry.assets().apply(&dir, entry.name()).await?;

            log::info!(
                "✓ Entry point '{}': {} asset(s) placed in {}",
                entry.name(),
                output.assets.len(),
                dir.display()
            );
            entries.push(output);
        }

        Ok(RendererOutput {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// Step one: bundles scripts and writes the document.
    async fn transform_entry(&self, entry: &EntryPoint, dir: &Path) -> Result<EntryOutput> {
        let rules = self.rules.clone();
        let project_root = self.project_root.clone();
        let owned = entry.clone();

        let (main, preload, html) = tokio::task::spawn_blocking(move || -> Result<_> {
            let transformer = Transformer::new(&rules, &project_root, owned.name());
            let main = transformer.bundle(owned.main_script(), "")?;
            let preload = owned
                .preload()
                .map(|p| transformer.bundle(p, ""))
                .transpose()?;
            let html = owned
                .html()
                .map(|p| {
                    std::fs::read_to_string(p).map_err(|e| Error::Transform {
                        entry_point: owned.name().to_string(),
                        file: p.to_path_buf(),
                        reason: format!("cannot read document: {e}"),
                    })
                })
                .transpose()?;
            Ok((main, preload, html))
        })
        .await
        .map_err(|e| Error::GenericError(format!("transform task panicked: {e}")))??;

        let main_name = script_file_name(entry.main_script());
        let main_bundle = dir.join(&main_name);
        fs::write_file(&main_bundle, &main.code).await?;

        let preload_bundle = match (entry.preload(), preload) {
            (Some(path), Some(bundle)) => {
                let target = dir.join(script_file_name(path));
                if target == main_bundle {
                    return Err(Error::config(format!(
                        "entry point '{}': main and preload scripts share the file name {}",
                        entry.name(),
                        main_name
                    )));
                }
                fs::write_file(&target, &bundle.code).await?;
                Some(target)
            }
            _ => None,
        };

        let html = match html {
            Some(doc) => {
                let target = dir.join("index.html");
                tokio::fs::write(&target, inject_script(&doc, &main_name))
                    .await
                    .fs_context("writing document", &target)?;
                Some(target)
            }
            None => None,
        };

        Ok(EntryOutput {
            name: entry.name().to_string(),
            dir: dir.to_path_buf(),
            html,
            main_bundle,
            preload_bundle,
            assets: Vec::new(),
        })
    }
}

fn script_file_name(script: &Path) -> String {
    script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.js".to_string())
}
