//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod build;
pub mod tags;
