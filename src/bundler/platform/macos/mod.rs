//! macOS packaging.

mod dmg;

pub use dmg::MacPackager;
