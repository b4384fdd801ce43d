//! Core Settings struct and implementations.

use super::{ChatSettings, ProductSettings, ReleaseSettings, ToolSettings, TorrentSettings};
use std::path::{Path, PathBuf};

/// Main settings for a build-server run.
///
/// Central configuration, constructed via [`SettingsBuilder`](super::SettingsBuilder)
/// or loaded from the project root with [`Settings::load`](super::Settings::load).
///
/// # Examples
///
/// ```no_run
/// use build_server::settings::SettingsBuilder;
///
/// # fn example() -> build_server::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_root("/srv/openshot-qt")
///     .build()?;
/// assert!(settings.log_path().ends_with("build/build-server.log"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Root of the application checkout.
    project_root: PathBuf,

    /// Product metadata.
    product: ProductSettings,

    /// External tool locations.
    tools: ToolSettings,

    /// Hosted release configuration.
    release: ReleaseSettings,

    /// Chat notification configuration.
    chat: ChatSettings,

    /// Peer-distribution configuration.
    torrent: TorrentSettings,
}

impl Settings {
    pub(super) fn new(
        project_root: PathBuf,
        product: ProductSettings,
        tools: ToolSettings,
        release: ReleaseSettings,
        chat: ChatSettings,
        torrent: TorrentSettings,
    ) -> Self {
        Self {
            project_root,
            product,
            tools,
            release,
            chat,
            torrent,
        }
    }

    /// Returns the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Directory holding frozen output, the artifact, its torrent and the log.
    pub fn build_dir(&self) -> PathBuf {
        self.project_root.join("build")
    }

    /// Path of the run log.
    pub fn log_path(&self) -> PathBuf {
        Self::log_path_in(&self.project_root)
    }

    /// Path of the run log for a checkout at `project_root`.
    ///
    /// Fixed by the root alone, so the log can be opened before
    /// `build-server.toml` is read.
    pub fn log_path_in(project_root: &Path) -> PathBuf {
        project_root.join("build").join("build-server.log")
    }

    /// Resolves a configured path against the project root.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Returns the product metadata.
    pub fn product(&self) -> &ProductSettings {
        &self.product
    }

    /// Returns the tool locations.
    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    /// Returns the release host configuration.
    pub fn release(&self) -> &ReleaseSettings {
        &self.release
    }

    /// Returns the chat configuration.
    pub fn chat(&self) -> &ChatSettings {
        &self.chat
    }

    /// Returns the torrent configuration.
    pub fn torrent(&self) -> &TorrentSettings {
        &self.torrent
    }
}
