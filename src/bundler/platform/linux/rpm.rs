//! RPM package generator.
//!
//! Off unless a maker enables it. Installs the packaged tree to
//! `/usr/lib/<name>/` plus a desktop entry.

use super::super::{Generator, MakeContext, archive_path};
use crate::bundler::{
    error::{ErrorExt, Result},
    packager::PackagedApp,
    settings::Platform,
    utils::fs::file_mode,
};
use std::{fs::File, io::BufWriter, path::PathBuf};

const RECOGNISED: &[&str] = &["homepage", "license", "release", "vendor"];

/// Builds `.rpm` packages for linux trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct RpmGenerator;

impl Generator for RpmGenerator {
    fn name(&self) -> &str {
        "rpm"
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Linux]
    }

    fn recognised_metadata(&self) -> &[&str] {
        RECOGNISED
    }

    fn make(&self, app: &PackagedApp, ctx: &MakeContext) -> Result<Vec<PathBuf>> {
        ctx.log_ignored_keys(self);
        let settings = &ctx.settings;
        let package = settings.package();

        let release = ctx.meta("release").unwrap_or("1");
        let license = ctx
            .meta("license")
            .or(package.license.as_deref())
            .unwrap_or("Proprietary");
        let version = package.version.replace('-', "~");
        let summary = if settings.description().is_empty() {
            settings.product_name()
        } else {
            settings.description()
        };

        let output_dir = ctx.make_dir.join("rpm").join(app.arch.as_str());
        std::fs::create_dir_all(&output_dir).fs_context("creating rpm output directory", &output_dir)?;
        let output = output_dir.join(format!(
            "{}-{}-{}.{}.rpm",
            package.name,
            version,
            release,
            app.arch.rpm()
        ));
        log::info!("Creating RPM package {}", output.display());

        let mut builder = rpm::PackageBuilder::new(
            &package.name,
            &version,
            license,
            app.arch.rpm(),
            summary,
        )
        .release(release)
        .description(summary);
        if let Some(url) = ctx.meta("homepage").or(package.homepage.as_deref()) {
            builder = builder.url(url);
        }
        if let Some(vendor) = ctx.meta("vendor").or(package.primary_author()) {
            builder = builder.vendor(vendor);
        }

        let install_dir = format!("/usr/lib/{}", package.name);
        for entry in walkdir::WalkDir::new(&app.root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_symlink() {
                log::warn!("rpm: skipping symlink {}", entry.path().display());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&app.root)?;
            let dest = format!("{install_dir}/{}", archive_path(relative));
            let mode = file_mode(&entry.metadata()?) as u16;
            builder = builder.with_file(
                entry.path(),
                rpm::FileOptions::new(dest).mode(rpm::FileMode::regular(mode)),
            )?;
        }

        let desktop_source = output_dir.join(format!("{}.desktop", package.name));
        std::fs::write(
            &desktop_source,
            super::desktop_entry(settings, app, None),
        )
        .fs_context("writing desktop entry", &desktop_source)?;
        builder = builder.with_file(
            &desktop_source,
            rpm::FileOptions::new(format!("/usr/share/applications/{}.desktop", package.name)),
        )?;

        let rpm = builder.build()?;
        std::fs::remove_file(&desktop_source).fs_context("removing desktop entry", &desktop_source)?;

        let file = File::create(&output).fs_context("creating rpm package", &output)?;
        rpm.write(&mut BufWriter::new(file))?;

        Ok(vec![output])
    }
}
