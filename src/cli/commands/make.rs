//! `make`: run the whole pipeline and print the report.

use super::load_settings;
use crate::{
    bundler::{Bundler, MakeReport},
    cli::{Args, RuntimeConfig},
    error::Result,
};

pub async fn make(args: &Args, runtime: &RuntimeConfig) -> Result<i32> {
    let settings = load_settings(args)?;
    let targets = settings.build_targets(&args.platforms, args.arch);
    let report_path = settings.out_dir().join("make").join("report.json");
    let bundler = Bundler::new(settings);

    runtime.progress(&format!(
        "Making {} {}",
        bundler.settings().product_name(),
        bundler.settings().version_string()
    ))?;
    let report = bundler.make(&targets).await?;
    print_report(&report, runtime)?;
    runtime.verbose_println(&format!("report written to {}", report_path.display()))?;

    if report.failures.is_empty() {
        runtime.success(&format!("{} artifact(s) created", report.artifacts.len()))?;
    } else if report.is_partial() {
        runtime.warn(&format!(
            "{} artifact(s) created, {} generator run(s) failed",
            report.artifacts.len(),
            report.failures.len()
        ))?;
    } else {
        // Generator errors never fail the build; the report carries them
        runtime.warn(&format!(
            "no distributables created, all {} generator run(s) failed",
            report.failures.len()
        ))?;
    }
    Ok(0)
}

fn print_report(report: &MakeReport, runtime: &RuntimeConfig) -> Result<()> {
    if !report.artifacts.is_empty() {
        runtime.section("Artifacts")?;
    }
    for artifact in &report.artifacts {
        runtime.indent(&format!(
            "{} [{} {}/{}] {} bytes",
            artifact.path.display(),
            artifact.generator,
            artifact.platform,
            artifact.arch,
            artifact.size
        ))?;
        runtime.verbose_println(&format!("        sha256 {}", artifact.sha256))?;
    }
    for skipped in &report.skipped {
        runtime.verbose_println(&format!(
            "    skipped {} for {}: {}",
            skipped.generator, skipped.platform, skipped.reason
        ))?;
    }
    if !report.failures.is_empty() {
        runtime.section("Failures")?;
    }
    for failure in &report.failures {
        runtime.warn(&format!(
            "{} failed for {}: {}",
            failure.generator, failure.platform, failure.error
        ))?;
    }
    Ok(())
}
