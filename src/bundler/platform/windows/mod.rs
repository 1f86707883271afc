//! Windows installer generators.

pub mod nsis;

pub use nsis::NsisGenerator;
