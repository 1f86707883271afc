//! Packaging pipeline.
//!
//! Data flows leaf-first: [`AssetManifest`] and [`RuleSet`] feed the
//! [`RendererStage`], which the [`Bundler`] runs before packaging one
//! [`PackagedApp`] per target platform. Generators then turn those trees into
//! distributables, independently of each other.

pub mod builder;
pub mod error;
pub mod hardening;
pub mod packager;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{Artifact, Bundler, Failure, MakeReport, PackageOutput, Skipped, ToolStatus};
pub use error::{Error, Result};
pub use hardening::FuseState;
pub use packager::PackagedApp;
pub use platform::{Generator, MakeContext};
pub use renderer::{
    AssetEntry, AssetManifest, BundleRule, Handler, RendererLayout, RendererOutput,
    RendererStage, RuleSet, RuleSetBuilder,
};
pub use settings::{
    Arch, BuildTargets, DistributableTarget, EntryPoint, Fuse, HardeningSettings, MakerKind,
    PackageSettings, PackagerSettings, Platform, RuntimeSettings, Settings, SettingsBuilder,
};
