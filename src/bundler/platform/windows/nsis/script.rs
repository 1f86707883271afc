//! NSIS installer script generation.
//!
//! Renders the installer script with Handlebars and writes it with the UTF-8
//! BOM NSIS expects.

use super::{template::NSI_TEMPLATE, utils};
use crate::bundler::{
    error::{Error, Result},
    packager::PackagedApp,
    platform::MakeContext,
};
use handlebars::Handlebars;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// Stable uninstall registry key for a package name.
pub fn uninstall_key(package_name: &str) -> String {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, package_name.as_bytes());
    format!("{{{}}}", id.hyphenated().to_string().to_uppercase())
}

/// Renders the installer script for `app`.
pub fn render_nsi_script(app: &PackagedApp, ctx: &MakeContext, executable: &str) -> Result<String> {
    let settings = &ctx.settings;
    let package = settings.package();

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    let publisher = ctx
        .meta("authors")
        .or(package.primary_author())
        .unwrap_or(settings.product_name());
    let description = ctx.meta("description").unwrap_or(settings.description());

    let mut data = BTreeMap::new();
    data.insert("product_name", utils::escape(settings.product_name()));
    data.insert("version", utils::escape(settings.version_string()));
    data.insert(
        "version_nsis",
        utils::format_version_for_nsis(settings.version_string()),
    );
    data.insert("publisher", utils::escape(publisher));
    data.insert("description", utils::escape(description));
    data.insert("executable", utils::escape(executable));
    data.insert(
        "install_dir",
        format!("$LOCALAPPDATA\\Programs\\{}", utils::escape(settings.product_name())),
    );
    data.insert("source_dir", app.root.display().to_string());
    data.insert("uninstall_key", uninstall_key(&package.name));

    handlebars
        .register_template_string("installer.nsi", NSI_TEMPLATE)
        .map_err(|e| Error::GenericError(format!("failed to register NSI template: {e}")))?;
    Ok(handlebars.render("installer.nsi", &data)?)
}

/// Renders and writes `installer.nsi` into `output_dir`.
pub fn generate_nsi_script(
    app: &PackagedApp,
    ctx: &MakeContext,
    executable: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let script = render_nsi_script(app, ctx, executable)?;
    let nsi_path = output_dir.join("installer.nsi");
    utils::write_utf8_bom(&nsi_path, &script)?;
    Ok(nsi_path)
}
