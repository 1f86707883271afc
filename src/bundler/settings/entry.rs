//! Application window entry points.

use crate::bundler::{
    error::{Error, Result},
    renderer::{AssetDecl, AssetEntry, AssetManifest},
    utils::fs::resolve_path,
};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Preload declaration: a bare path or a `{ js = "..." }` table.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PreloadDecl {
    /// `preload = "src/preload.js"`
    Path(PathBuf),
    /// `preload = { js = "src/preload.js" }`
    Table {
        /// Preload script
        js: PathBuf,
    },
}

impl PreloadDecl {
    fn into_path(self) -> PathBuf {
        match self {
            PreloadDecl::Path(p) | PreloadDecl::Table { js: p } => p,
        }
    }
}

/// `[[renderer.entry_points]]` entry as declared in configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPointDecl {
    /// Window name
    pub name: String,
    /// Document template
    #[serde(default)]
    pub html: Option<PathBuf>,
    /// Main renderer script; required, but checked during validation
    #[serde(default)]
    pub js: Option<PathBuf>,
    /// Preload script
    #[serde(default)]
    pub preload: Option<PreloadDecl>,
    /// Prebuilt assets copied next to the bundles
    #[serde(default)]
    pub assets: Vec<AssetDecl>,
}

/// One packaged application window.
#[derive(Clone, Debug)]
pub struct EntryPoint {
    name: String,
    html: Option<PathBuf>,
    main_script: PathBuf,
    preload: Option<PathBuf>,
    assets: AssetManifest,
}

impl EntryPoint {
    /// Creates an entry point with only a main script.
    pub fn new(name: impl Into<String>, main_script: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            html: None,
            main_script: main_script.into(),
            preload: None,
            assets: AssetManifest::default(),
        }
    }

    pub fn with_html(mut self, html: impl Into<PathBuf>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_preload(mut self, preload: impl Into<PathBuf>) -> Self {
        self.preload = Some(preload.into());
        self
    }

    pub fn with_assets(mut self, assets: AssetManifest) -> Self {
        self.assets = assets;
        self
    }

    /// Validates a declaration, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the name is not a valid window name,
    /// `js` is missing, or an asset destination is invalid.
    pub fn from_decl(decl: EntryPointDecl, base: &Path) -> Result<Self> {
        validate_name(&decl.name)?;
        let name = decl.name;
        let main_script = decl.js.ok_or_else(|| {
            Error::config(format!("entry point '{name}' does not declare a main script (js)"))
        })?;

        let mut assets = AssetManifest::default();
        for asset in decl.assets {
            let entry = AssetEntry::new(resolve_path(base, &asset.from), &asset.to).map_err(|e| {
                let reason = match e {
                    Error::Configuration(reason) => reason,
                    other => other.to_string(),
                };
                Error::config(format!("entry point '{name}': {reason}"))
            })?;
            assets.push(entry);
        }

        Ok(Self {
            html: decl.html.map(|p| resolve_path(base, &p)),
            main_script: resolve_path(base, &main_script),
            preload: decl.preload.map(|p| resolve_path(base, &p.into_path())),
            assets,
            name,
        })
    }

    /// Window name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name upper-cased for generated constants (`main_window` -> `MAIN_WINDOW`).
    pub fn constant_prefix(&self) -> String {
        constant_prefix(&self.name)
    }

    pub fn html(&self) -> Option<&Path> {
        self.html.as_deref()
    }

    pub fn main_script(&self) -> &Path {
        &self.main_script
    }

    pub fn preload(&self) -> Option<&Path> {
        self.preload.as_deref()
    }

    pub fn assets(&self) -> &AssetManifest {
        &self.assets
    }
}

fn constant_prefix(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Checks that `name` can serve both as a directory under the renderer root
/// and as the prefix of a generated `<PREFIX>_WEBPACK_ENTRY` constant.
///
/// # Errors
///
/// [`Error::Configuration`] when the name is empty, is not a single plain
/// path component, or its constant prefix starts with a digit.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config("entry point name cannot be empty"));
    }
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    );
    if !plain {
        return Err(Error::config(format!(
            "entry point name '{name}' must be a plain directory name without separators or '..'"
        )));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::config(format!(
            "entry point name '{name}' yields the constant {}_WEBPACK_ENTRY, which is not a valid identifier",
            constant_prefix(name)
        )));
    }
    Ok(())
}
