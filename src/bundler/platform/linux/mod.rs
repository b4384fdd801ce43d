//! Linux packaging.

mod appimage;

pub use appimage::{LinuxPackager, rewrite_desktop_entry};
