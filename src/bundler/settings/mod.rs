//! Configuration structures for packaging operations.
//!
//! This module provides the validated [`Settings`] consumed by the
//! orchestrator, the declaration types deserialized from the project file,
//! and a [`SettingsBuilder`] that checks everything before a build starts.

mod arch;
mod builder;
mod core;
mod entry;
mod hardening;
mod maker;
mod package;
mod packager;
mod platform;

// Re-export all public types
pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use self::core::{BuildTargets, Settings};
pub use entry::{EntryPoint, EntryPointDecl, PreloadDecl, validate_name};
pub use hardening::{Fuse, HardeningDecl, HardeningSettings};
pub use maker::{DistributableTarget, MakerDecl, MakerKind, MetadataValue};
pub use package::PackageSettings;
pub use packager::{PackagerSettings, RuntimeSettings};
pub use platform::Platform;
