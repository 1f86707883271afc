//! Debian package generator.
//!
//! Writes the `.deb` directly: an `ar` archive of `debian-binary`,
//! `control.tar.gz` (control file and md5sums) and `data.tar.gz`. The
//! packaged tree is installed to `/usr/lib/<name>/` with a launcher symlink in
//! `/usr/bin/` and a desktop entry in `/usr/share/applications/`.

use super::super::{Generator, MakeContext, archive_path, source_date_epoch};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    packager::PackagedApp,
    settings::Platform,
    utils::fs::file_mode,
};
use flate2::{Compression, write::GzEncoder};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

const RECOGNISED: &[&str] = &[
    "maintainer",
    "homepage",
    "description",
    "section",
    "priority",
    "depends",
    "categories",
];

/// Builds `.deb` packages for linux trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebianGenerator;

/// Debian-safe version: semver pre-release separators sort before releases.
pub fn debian_version(version: &str) -> String {
    version.replacen('-', "~", 1)
}

/// Contents of `data.tar.gz` plus what the control archive needs.
struct DataArchive {
    gz: Vec<u8>,
    md5sums: String,
    installed_size_kib: u64,
}

fn tar_header(kind: tar::EntryType, mode: u32, size: u64, mtime: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(mtime);
    header.set_uid(0);
    header.set_gid(0);
    header
}

fn append_dir<W: Write>(tar: &mut tar::Builder<W>, path: &str, mtime: u64) -> Result<()> {
    let mut header = tar_header(tar::EntryType::Directory, 0o755, 0, mtime);
    tar.append_data(&mut header, path, std::io::empty())?;
    Ok(())
}

fn append_file<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &str,
    mode: u32,
    data: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = tar_header(tar::EntryType::Regular, mode, data.len() as u64, mtime);
    tar.append_data(&mut header, path, data)?;
    Ok(())
}

fn append_symlink<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &str,
    target: &Path,
    mtime: u64,
) -> Result<()> {
    let mut header = tar_header(tar::EntryType::Symlink, 0o777, 0, mtime);
    tar.append_link(&mut header, path, target)?;
    Ok(())
}

fn build_data(app: &PackagedApp, ctx: &MakeContext, mtime: u64) -> Result<DataArchive> {
    let package = ctx.settings.package();
    let install_dir = format!("usr/lib/{}", package.name);

    let mut tar = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let mut md5sums = String::new();
    let mut total = 0u64;

    for dir in ["usr", "usr/lib", "usr/bin", "usr/share", "usr/share/applications"] {
        append_dir(&mut tar, dir, mtime)?;
    }

    for entry in walkdir::WalkDir::new(&app.root).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(&app.root)?;
        let path = if relative.as_os_str().is_empty() {
            install_dir.clone()
        } else {
            format!("{install_dir}/{}", archive_path(relative))
        };

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())
                .fs_context("reading symlink", entry.path())?;
            append_symlink(&mut tar, &path, &target, mtime)?;
        } else if entry.file_type().is_dir() {
            append_dir(&mut tar, &path, mtime)?;
        } else {
            let data = std::fs::read(entry.path()).fs_context("reading packaged file", entry.path())?;
            let mode = file_mode(&entry.metadata()?);
            append_file(&mut tar, &path, mode, &data, mtime)?;
            md5sums.push_str(&format!("{:x}  {path}\n", md5::compute(&data)));
            total += data.len() as u64;
        }
    }

    if let Some(executable) = app.executable.as_ref().and_then(|e| e.file_name()) {
        let target = PathBuf::from("../lib").join(&package.name).join(executable);
        append_symlink(&mut tar, &format!("usr/bin/{}", package.executable_name), &target, mtime)?;
    }

    let desktop = super::desktop_entry(&ctx.settings, app, ctx.meta("categories"));
    let desktop_path = format!("usr/share/applications/{}.desktop", package.name);
    append_file(&mut tar, &desktop_path, 0o644, desktop.as_bytes(), mtime)?;
    md5sums.push_str(&format!("{:x}  {desktop_path}\n", md5::compute(desktop.as_bytes())));
    total += desktop.len() as u64;

    let gz = tar.into_inner()?.finish()?;
    Ok(DataArchive {
        gz,
        md5sums,
        installed_size_kib: total.div_ceil(1024),
    })
}

fn control_file(
    app: &PackagedApp,
    ctx: &MakeContext,
    maintainer: &str,
    installed_size_kib: u64,
) -> String {
    let settings = &ctx.settings;
    let package = settings.package();

    let mut control = String::new();
    control.push_str(&format!("Package: {}\n", package.name));
    control.push_str(&format!("Version: {}\n", debian_version(&package.version)));
    control.push_str(&format!("Architecture: {}\n", app.arch.debian()));
    control.push_str(&format!("Maintainer: {maintainer}\n"));
    control.push_str(&format!("Installed-Size: {installed_size_kib}\n"));
    if let Some(depends) = ctx.meta("depends") {
        control.push_str(&format!("Depends: {depends}\n"));
    }
    control.push_str(&format!("Section: {}\n", ctx.meta("section").unwrap_or("utils")));
    control.push_str(&format!("Priority: {}\n", ctx.meta("priority").unwrap_or("optional")));
    if let Some(homepage) = ctx.meta("homepage").or(package.homepage.as_deref()) {
        control.push_str(&format!("Homepage: {homepage}\n"));
    }

    let description = ctx
        .meta("description")
        .or(Some(settings.description()).filter(|d| !d.is_empty()))
        .unwrap_or(settings.product_name());
    let mut lines = description.lines();
    control.push_str(&format!("Description: {}\n", lines.next().unwrap_or_default().trim()));
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            control.push_str(" .\n");
        } else {
            control.push_str(&format!(" {line}\n"));
        }
    }
    control
}

fn build_control(control: &str, md5sums: &str, mtime: u64) -> Result<Vec<u8>> {
    let mut tar = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_file(&mut tar, "control", 0o644, control.as_bytes(), mtime)?;
    append_file(&mut tar, "md5sums", 0o644, md5sums.as_bytes(), mtime)?;
    Ok(tar.into_inner()?.finish()?)
}

impl Generator for DebianGenerator {
    fn name(&self) -> &str {
        "deb"
    }

    fn supported_platforms(&self) -> &[Platform] {
        &[Platform::Linux]
    }

    fn recognised_metadata(&self) -> &[&str] {
        RECOGNISED
    }

    fn make(&self, app: &PackagedApp, ctx: &MakeContext) -> Result<Vec<PathBuf>> {
        ctx.log_ignored_keys(self);
        let package = ctx.settings.package();

        let maintainer = ctx
            .meta("maintainer")
            .or(package.primary_author())
            .ok_or_else(|| Error::Generator {
                generator: self.name().to_string(),
                platform: app.platform,
                reason: "no maintainer configured and the package has no authors".into(),
            })?;

        let output_dir = ctx.make_dir.join("deb").join(app.arch.as_str());
        std::fs::create_dir_all(&output_dir).fs_context("creating deb output directory", &output_dir)?;
        let output = output_dir.join(format!(
            "{}_{}_{}.deb",
            package.name,
            debian_version(&package.version),
            app.arch.debian()
        ));
        log::info!("Creating Debian package {}", output.display());

        let mtime = source_date_epoch();
        let data = build_data(app, ctx, mtime)?;
        let control = control_file(app, ctx, maintainer, data.installed_size_kib);
        let control_gz = build_control(&control, &data.md5sums, mtime)?;

        let file = File::create(&output).fs_context("creating deb package", &output)?;
        let mut ar = ar::Builder::new(file);
        for (name, body) in [
            ("debian-binary", b"2.0\n".as_slice()),
            ("control.tar.gz", control_gz.as_slice()),
            ("data.tar.gz", data.gz.as_slice()),
        ] {
            let mut header = ar::Header::new(name.as_bytes().to_vec(), body.len() as u64);
            header.set_mode(0o100644);
            header.set_mtime(mtime);
            ar.append(&header, body).fs_context("writing deb member", &output)?;
        }

        Ok(vec![output])
    }
}
