//! `check`: validate configuration without building.

use super::load_settings;
use crate::{
    bundler::builder,
    cli::{Args, RuntimeConfig},
    error::Result,
};

/// Validates configuration and target selection, then reports the external
/// tools the enabled makers need.
///
/// Missing tools are warnings: the affected generator fails on its own at
/// make time while the others still run.
pub fn check(args: &Args, runtime: &RuntimeConfig) -> Result<i32> {
    let settings = load_settings(args)?;
    let targets = settings.build_targets(&args.platforms, args.arch);
    settings.validate_targets(&targets)?;

    runtime.section("Configuration")?;
    runtime.indent(&format!(
        "{} {} ({})",
        settings.product_name(),
        settings.version_string(),
        settings.package().name
    ))?;
    let platforms: Vec<_> = targets.platforms.iter().map(|p| p.as_str()).collect();
    runtime.indent(&format!("targets: {} / {}", platforms.join(", "), targets.arch))?;
    for entry in settings.renderer().entry_points() {
        runtime.indent(&format!(
            "entry point '{}': {} asset(s)",
            entry.name(),
            entry.assets().entries().len()
        ))?;
    }
    for maker in settings.makers() {
        let state = if maker.enabled { "enabled" } else { "disabled" };
        runtime.verbose_println(&format!("    maker {} ({state})", maker.kind))?;
    }
    for platform in &targets.platforms {
        if !settings.packager().runtimes.contains_key(platform) {
            runtime.warn(&format!(
                "no runtime configured for {platform}; its tree will hold app content only"
            ))?;
        }
    }

    let tools = builder::required_tools(&settings);
    if !tools.is_empty() {
        runtime.section("Tools")?;
    }
    for tool in &tools {
        match (&tool.location, &tool.version) {
            (Some(location), Some(version)) => runtime.indent(&format!(
                "{} {} ({})",
                tool.tool,
                version,
                location.display()
            ))?,
            _ => runtime.warn(&format!(
                "{} not available; {} will fail",
                tool.tool, tool.required_by
            ))?,
        }
    }

    runtime.success("configuration is valid")?;
    Ok(0)
}
