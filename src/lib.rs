//! Release packaging pipeline for desktop installers.
//!
//! Given the frozen build output for the host OS, the build server:
//! - packages it into one installer (AppImage, DMG or Inno Setup `.exe`)
//! - uploads the installer and a companion torrent to the hosted release
//! - posts a pass/fail summary with the run log to the team chat
//!
//! Failures are collected in an error ledger; a non-empty ledger skips
//! publication and makes the process exit with status 1.

pub mod bundler;
pub mod cli;
pub mod context;
pub mod error;
pub mod metadata;
pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use error::{CliError, Error, Result};
