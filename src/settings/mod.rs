//! Configuration for a build-server run.
//!
//! Defaults reproduce the production build server. A `build-server.toml` in
//! the project root may replace any table (`[product]`, `[tools]`,
//! `[release]`, `[chat]`, `[torrent]`); fields missing from a table keep
//! their defaults.

mod arch;
mod builder;
mod core;
mod product;
mod services;
mod tools;

pub use arch::Arch;
pub use builder::{SETTINGS_FILE, SettingsBuilder};
pub use core::Settings;
pub use product::ProductSettings;
pub use services::{ChatSettings, ReleaseSettings, TorrentSettings};
pub use tools::ToolSettings;
