//! `package`: build packaged app trees.

use super::load_settings;
use crate::{
    bundler::{Bundler, utils::fs::tree_size},
    cli::{Args, RuntimeConfig},
    error::Result,
};

pub async fn package(args: &Args, runtime: &RuntimeConfig) -> Result<i32> {
    let settings = load_settings(args)?;
    let targets = settings.build_targets(&args.platforms, args.arch);
    let bundler = Bundler::new(settings);

    runtime.progress(&format!(
        "Packaging {} {}",
        bundler.settings().product_name(),
        bundler.settings().version_string()
    ))?;
    let output = bundler.package(&targets).await?;

    for entry in &output.renderer.entries {
        runtime.verbose_println(&format!("    renderer {} -> {}", entry.name, entry.dir.display()))?;
    }
    runtime.section("Packaged")?;
    for app in &output.apps {
        let size = tree_size(&app.root)?;
        runtime.indent(&format!("{} ({} KiB)", app.root.display(), size.div_ceil(1024)))?;
    }
    runtime.success(&format!("{} tree(s) packaged", output.apps.len()))?;
    Ok(0)
}
