//! Shared helpers for packagers and service clients.

pub mod fs;
pub mod http;
