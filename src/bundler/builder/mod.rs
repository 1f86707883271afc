//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that runs the
//! whole packaging pipeline.
//!
//! # Overview
//!
//! The bundler:
//! 1. Validates the build targets against [`Settings`](crate::bundler::Settings)
//! 2. Runs the renderer stage and bundles the main-process script
//! 3. Packages one app tree per target platform and applies hardening
//! 4. Fans out to the distributable generators
//! 5. Calculates checksums and writes the [`MakeReport`]
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Bundler`] struct and pipeline operations
//! - [`report`] - Make report types
//! - [`tool_detection`] - External tool availability checking

mod checksum;
mod orchestrator;
mod report;
mod tool_detection;

pub use orchestrator::{Bundler, PackageOutput};
pub use report::{Artifact, Failure, MakeReport, Skipped};
pub use tool_detection::{ToolStatus, detect_tool, required_tools};
