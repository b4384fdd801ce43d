//! Installer packaging.
//!
//! - [`platform`] - the per-OS [`Packager`] strategies
//! - [`tool`] - external tool execution and output interpretation
//! - [`artifact`] - the finished installer and its digest
//! - [`utils`] - file system and HTTP helpers

pub mod artifact;
pub mod platform;
pub mod tool;
pub mod utils;

pub use artifact::Artifact;
pub use platform::{Packager, Platform, SigningKey};
