//! Subcommand handlers.

mod check;
mod fuses;
mod make;
mod package;

pub use check::check;
pub use fuses::fuses;
pub use make::make;
pub use package::package;

use crate::{
    bundler::Settings,
    cli::Args,
    error::Result,
    metadata,
};
use anyhow::Context as _;
use path_absolutize::Absolutize;

/// Loads settings from `--config`, applying `--out-dir`.
///
/// A relative `--out-dir` is taken relative to the working directory, not
/// the configuration file.
pub(crate) fn load_settings(args: &Args) -> Result<Settings> {
    let (mut config, base) = metadata::load_config(&args.config)?;
    if let Some(out_dir) = &args.out_dir {
        let out_dir = out_dir
            .absolutize()
            .with_context(|| format!("resolving output directory {}", out_dir.display()))?;
        config.packager.out_dir = Some(out_dir.into_owned());
    }
    Ok(config.into_settings(&base)?)
}
