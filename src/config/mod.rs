//! Input configuration
//!
//! The package list is the only configuration file; the base manifest is
//! handled by [`crate::manifest`].

mod packages;

pub use packages::{PackageList, PackageSpec};
