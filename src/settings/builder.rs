//! Builder for constructing Settings, and loading them from `build-server.toml`.

use super::{
    ChatSettings, ProductSettings, ReleaseSettings, Settings, ToolSettings, TorrentSettings,
};
use crate::error::{CliError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional override file in the project root.
pub const SETTINGS_FILE: &str = "build-server.toml";

/// Builder for constructing [`Settings`].
///
/// Every section defaults to the values of the production build server;
/// only the project root is required.
///
/// # Examples
///
/// ```no_run
/// use build_server::settings::{SettingsBuilder, ToolSettings};
///
/// # fn example() -> build_server::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_root(".")
///     .tools(ToolSettings {
///         mktorrent: "/usr/local/bin/mktorrent".into(),
///         ..Default::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    project_root: Option<PathBuf>,
    product: ProductSettings,
    tools: ToolSettings,
    release: ReleaseSettings,
    chat: ChatSettings,
    torrent: TorrentSettings,
}

/// On-disk shape of `build-server.toml`. Missing tables keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    product: Option<ProductSettings>,
    tools: Option<ToolSettings>,
    release: Option<ReleaseSettings>,
    chat: Option<ChatSettings>,
    torrent: Option<TorrentSettings>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the project root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn project_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets product metadata.
    pub fn product(mut self, product: ProductSettings) -> Self {
        self.product = product;
        self
    }

    /// Sets tool locations.
    pub fn tools(mut self, tools: ToolSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the release host configuration.
    pub fn release(mut self, release: ReleaseSettings) -> Self {
        self.release = release;
        self
    }

    /// Sets the chat configuration.
    pub fn chat(mut self, chat: ChatSettings) -> Self {
        self.chat = chat;
        self
    }

    /// Sets the torrent configuration.
    pub fn torrent(mut self, torrent: TorrentSettings) -> Self {
        self.torrent = torrent;
        self
    }

    /// Applies overrides parsed from a `build-server.toml` document.
    pub fn merge_toml(mut self, contents: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(contents)?;
        if let Some(product) = file.product {
            self.product = product;
        }
        if let Some(tools) = file.tools {
            self.tools = tools;
        }
        if let Some(release) = file.release {
            self.release = release;
        }
        if let Some(chat) = file.chat {
            self.chat = chat;
        }
        if let Some(torrent) = file.torrent {
            self.torrent = torrent;
        }
        Ok(self)
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `project_root` is missing or upload attempts is zero.
    pub fn build(self) -> Result<Settings> {
        let project_root = self.project_root.ok_or_else(|| CliError::InvalidArguments {
            reason: "project_root is required".to_string(),
        })?;

        if self.release.upload_attempts == 0 {
            return Err(CliError::InvalidArguments {
                reason: "release.upload_attempts must be at least 1".to_string(),
            }
            .into());
        }

        Ok(Settings::new(
            project_root,
            self.product,
            self.tools,
            self.release,
            self.chat,
            self.torrent,
        ))
    }
}

impl Settings {
    /// Loads settings for `project_root`, applying `build-server.toml` when present.
    pub fn load(project_root: &Path) -> Result<Settings> {
        let builder = SettingsBuilder::new().project_root(project_root);
        let file = project_root.join(SETTINGS_FILE);

        if !file.exists() {
            log::debug!("No {} in {}, using defaults", SETTINGS_FILE, project_root.display());
            return builder.build();
        }

        let contents = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        log::info!("Loaded settings overrides from {}", file.display());
        builder.merge_toml(&contents)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let settings = SettingsBuilder::new()
            .project_root("/srv/app")
            .merge_toml("[tools]\nmktorrent = \"/opt/mktorrent\"\n\n[release]\ntag = \"nightly\"\n")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(settings.tools().mktorrent, "/opt/mktorrent");
        assert_eq!(settings.tools().iscc, "iscc.exe");
        assert_eq!(settings.release().tag, "nightly");
        assert_eq!(settings.release().upload_attempts, 3);
        assert_eq!(settings.chat().stream, "build-server");
    }

    #[test]
    fn unknown_tables_are_rejected() {
        let result = SettingsBuilder::new().merge_toml("[deploy]\nx = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_upload_attempts_is_invalid() {
        let result = SettingsBuilder::new()
            .project_root("/srv/app")
            .merge_toml("[release]\nupload_attempts = 0\n")
            .unwrap()
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.log_path(), dir.path().join("build/build-server.log"));
        assert_eq!(settings.torrent().trackers.len(), 3);
    }

    #[test]
    fn relative_tool_paths_resolve_against_root() {
        let settings = SettingsBuilder::new().project_root("/srv/app").build().unwrap();
        assert_eq!(
            settings.resolve(&settings.tools().mac_dmg_script),
            PathBuf::from("/srv/app/installer/build-mac-dmg.sh")
        );
    }
}
