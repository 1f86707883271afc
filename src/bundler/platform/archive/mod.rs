//! Compressed archive distributables.

mod zip;

pub use self::zip::ZipGenerator;
