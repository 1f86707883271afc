//! `fuses`: print the fuse wire of a runtime binary.

use crate::{
    bundler::{FuseState, hardening},
    cli::RuntimeConfig,
    error::Result,
};
use std::path::Path;

pub async fn fuses(binary: &Path, runtime: &RuntimeConfig) -> Result<i32> {
    let states = hardening::inspect(binary).await?;

    runtime.section(&binary.display().to_string())?;
    for (fuse, state) in states {
        let state = match state {
            FuseState::Enabled => "enabled".to_string(),
            FuseState::Disabled => "disabled".to_string(),
            FuseState::Removed => "removed".to_string(),
            FuseState::Absent => "absent".to_string(),
            FuseState::Unknown(byte) => format!("unknown ({byte:#04x})"),
        };
        runtime.indent(&format!("{:<34} {state}", fuse.name()))?;
    }
    Ok(0)
}
