//! Platform-specific installer packaging.
//!
//! Exactly one [`Packager`] runs per build, selected from the host OS at
//! startup. Every packager follows the same contract:
//!
//! - `Ok(Some(artifact))`: exactly one installer exists at the artifact path.
//! - `Ok(None)`: a failure was recorded in the session ledger and any partial
//!   installer was deleted.
//! - `Err(_)`: an unexpected error (I/O, tool launch) ended packaging.
//!
//! Every module compiles on every host so the packaging steps can be
//! exercised from any test machine.

pub mod linux;
pub mod macos;
pub mod windows;

use crate::bundler::Artifact;
use crate::context::BuildContext;
use crate::error::{CliError, Result};
use crate::session::Session;
use crate::settings::{Arch, Settings};

pub use linux::LinuxPackager;
pub use macos::MacPackager;
pub use windows::{SigningKey, WindowsPackager};

/// Operating system the build runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// AppImage builds.
    Linux,
    /// Disk image builds.
    MacOs,
    /// Inno Setup installers.
    Windows,
}

impl Platform {
    /// Maps the host OS to a platform.
    pub fn detect() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            "windows" => Ok(Platform::Windows),
            other => Err(CliError::UnsupportedPlatform { os: other.into() }.into()),
        }
    }

    /// System name used in log headers, chat messages and the uploaded log
    /// file name.
    pub fn name(self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOs => "Darwin",
            Platform::Windows => "Windows",
        }
    }

    /// File extension of the installer.
    pub fn installer_extension(self) -> &'static str {
        match self {
            Platform::Linux => "AppImage",
            Platform::MacOs => "dmg",
            Platform::Windows => "exe",
        }
    }

    /// `<arch>.<ext>` part of the artifact name.
    ///
    /// Only Windows builds honour a 32-bit request.
    pub fn artifact_suffix(self, arch: Arch) -> String {
        let arch = match self {
            Platform::Windows => arch,
            Platform::Linux | Platform::MacOs => Arch::X86_64,
        };
        format!("{}.{}", arch.suffix(), self.installer_extension())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The packaging strategy for one platform.
#[derive(Debug)]
pub enum Packager {
    /// AppDir assembly plus AppImageAssistant.
    Linux(LinuxPackager),
    /// Disk image script.
    MacOs(MacPackager),
    /// Frozen tree repair, Inno Setup and code signing.
    Windows(WindowsPackager),
}

impl Packager {
    /// Selects the strategy for `platform`.
    ///
    /// `signing` is only used on Windows.
    pub fn for_platform(platform: Platform, settings: &Settings, signing: Option<SigningKey>) -> Self {
        match platform {
            Platform::Linux => Packager::Linux(LinuxPackager::new(settings.clone())),
            Platform::MacOs => Packager::MacOs(MacPackager::new(settings.clone())),
            Platform::Windows => {
                Packager::Windows(WindowsPackager::new(settings.clone(), signing))
            }
        }
    }

    /// Builds the installer for `ctx`.
    pub async fn package(
        &self,
        ctx: &BuildContext,
        session: &mut Session,
    ) -> Result<Option<Artifact>> {
        match self {
            Packager::Linux(packager) => packager.package(ctx, session).await,
            Packager::MacOs(packager) => packager.package(ctx, session).await,
            Packager::Windows(packager) => packager.package(ctx, session).await,
        }
    }
}
