//! Linux package generators.

pub mod debian;
pub mod rpm;

pub use debian::DebianGenerator;
pub use rpm::RpmGenerator;

use crate::bundler::{packager::PackagedApp, settings::Settings};

/// Freedesktop entry launching the packaged executable.
pub(crate) fn desktop_entry(settings: &Settings, app: &PackagedApp, categories: Option<&str>) -> String {
    let package = settings.package();
    let mut entry = String::from("[Desktop Entry]\nType=Application\n");
    entry.push_str(&format!("Name={}\n", settings.product_name()));
    entry.push_str(&format!("Exec={} %U\n", package.executable_name));
    entry.push_str(&format!("Icon={}\n", package.name));
    if !settings.description().is_empty() {
        entry.push_str(&format!("Comment={}\n", settings.description()));
    }
    if let Some(categories) = categories {
        entry.push_str(&format!("Categories={};\n", categories.trim_end_matches(';')));
    }
    if app.executable.is_none() {
        log::warn!("{} has no executable; desktop entry will not launch", app.dir_name());
    }
    entry.push_str("Terminal=false\n");
    entry
}
