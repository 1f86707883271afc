//! Zip archive generator.
//!
//! Output: `make/zip/<platform>/<arch>/<Product>-<platform>-<arch>-<version>.zip`,
//! holding the packaged tree under its directory name. Unix modes and
//! symlinks are preserved.

use super::super::{Generator, MakeContext, archive_path};
use crate::bundler::{
    error::{ErrorExt, Result},
    packager::PackagedApp,
    settings::Platform,
    utils::fs::file_mode,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Builds a zip of the packaged tree for any platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipGenerator;

impl Generator for ZipGenerator {
    fn name(&self) -> &str {
        "zip"
    }

    fn supported_platforms(&self) -> &[Platform] {
        &Platform::ALL
    }

    fn make(&self, app: &PackagedApp, ctx: &MakeContext) -> Result<Vec<PathBuf>> {
        ctx.log_ignored_keys(self);
        let settings = &ctx.settings;

        let output_dir = ctx
            .make_dir
            .join("zip")
            .join(app.platform.as_str())
            .join(app.arch.as_str());
        std::fs::create_dir_all(&output_dir).fs_context("creating zip output directory", &output_dir)?;

        let output = output_dir.join(format!(
            "{}-{}-{}-{}.zip",
            settings.product_name(),
            app.platform,
            app.arch,
            settings.version_string()
        ));
        log::info!("Creating zip archive {}", output.display());

        let file = File::create(&output).fs_context("creating zip archive", &output)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let prefix = PathBuf::from(app.dir_name());
        for entry in walkdir::WalkDir::new(&app.root).sort_by_file_name() {
            let entry = entry?;
            let relative = entry.path().strip_prefix(&app.root)?;
            let name = archive_path(&prefix.join(relative));

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                writer.add_symlink(name, archive_path(&target), base)?;
            } else if entry.file_type().is_dir() {
                let mode = file_mode(&entry.metadata()?);
                writer.add_directory(format!("{name}/"), base.unix_permissions(mode))?;
            } else {
                let mode = file_mode(&entry.metadata()?);
                writer.start_file(name, base.unix_permissions(mode))?;
                let mut input = File::open(entry.path()).fs_context("opening file", entry.path())?;
                std::io::copy(&mut input, &mut writer).fs_context("writing zip entry", &output)?;
            }
        }

        let mut inner = writer.finish()?;
        inner.flush().fs_context("flushing zip archive", &output)?;

        Ok(vec![output])
    }
}
