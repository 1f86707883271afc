//! Package metadata shared by every packaged tree and generator.

/// Package metadata and configuration.
///
/// Loaded from the `[package]` table of the project configuration.
///
/// # Examples
///
/// ```no_run
/// use appshell_bundler::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     name: "webgpu-demo".into(),
///     product_name: "WebGPU Demo".into(),
///     version: "1.0.0".into(),
///     description: "WebGPU client in a desktop shell".into(),
///     executable_name: "webgpu-demo".into(),
///     authors: vec!["Armchair Software".into()],
///     homepage: Some("https://armchair.software".into()),
///     license: None,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageSettings {
    /// Machine name (lowercase, used for directories and package names).
    pub name: String,

    /// Product name displayed to users.
    ///
    /// Defaults to `name` when not configured.
    pub product_name: String,

    /// Version string, validated as semver.
    pub version: String,

    /// Brief description of the application.
    pub description: String,

    /// Name of the packaged host executable (without `.exe`).
    ///
    /// Defaults to `name` when not configured.
    pub executable_name: String,

    /// List of package authors.
    pub authors: Vec<String>,

    /// Homepage URL for the application.
    pub homepage: Option<String>,

    /// SPDX license identifier.
    pub license: Option<String>,
}

impl PackageSettings {
    /// First author, used where a format wants a single vendor name.
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }
}
