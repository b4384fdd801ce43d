//! Version information and build names from artifact metadata files.
//!
//! Each upstream component drops a `<component>.env` file (`KEY=VALUE`
//! lines) into `<install-dir>/share/`. Keys are stored as
//! `<component>.<KEY>`. The application's `GIT_DESCRIBE` value
//! (e.g. `v3.1.1-18-ga01a98c`) drives the build name and version number.

use crate::context::is_published_branch;
use crate::error::{Error, ErrorExt, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Components whose metadata is collected, in load order.
pub const COMPONENTS: [&str; 3] = ["libopenshot-audio", "libopenshot", "openshot-qt"];

/// Component whose description names the build.
pub const APP_COMPONENT: &str = "openshot-qt";

/// Key holding the `git describe` output of a component.
pub const DESCRIBE_KEY: &str = "GIT_DESCRIBE";

/// Matches the version following the first `v` up to a `-` or the end.
const VERSION_PATTERN: &str = r"v(.+?)($|-)";

/// Source of version information and the build name.
pub trait MetadataSource {
    /// Loads the version-info mapping for every component.
    fn version_info(&self) -> Result<BTreeMap<String, String>>;

    /// Derives the display name of this build.
    fn build_name(&self, version_info: &BTreeMap<String, String>, branch: &str) -> Result<String>;
}

/// Reads `<component>.env` files from the install directory.
#[derive(Debug, Clone)]
pub struct EnvFileMetadata {
    build_dir: PathBuf,
    prefix: String,
}

impl EnvFileMetadata {
    /// `build_dir` is searched for `install-x64`, then `install-x86`.
    pub fn new(build_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            build_dir: build_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Locates the install directory of the frozen build, if any.
    pub fn install_dir(&self) -> Option<PathBuf> {
        ["install-x64", "install-x86"]
            .iter()
            .map(|name| self.build_dir.join(name))
            .find(|path| path.exists())
    }
}

impl MetadataSource for EnvFileMetadata {
    fn version_info(&self) -> Result<BTreeMap<String, String>> {
        let mut info = BTreeMap::new();
        let Some(install_dir) = self.install_dir() else {
            log::warn!(
                "No install directory (install-x64 / install-x86) in {}",
                self.build_dir.display()
            );
            return Ok(info);
        };

        for component in COMPONENTS {
            let path = env_file_path(&install_dir, component);
            if !path.exists() {
                log::warn!("Version file not found: {}", path.display());
                continue;
            }
            let contents =
                std::fs::read_to_string(&path).fs_context("reading version file", &path)?;
            for (key, value) in parse_env_file(&contents) {
                info.insert(format!("{component}.{key}"), value);
            }
        }

        Ok(info)
    }

    fn build_name(&self, version_info: &BTreeMap<String, String>, branch: &str) -> Result<String> {
        build_name(&self.prefix, version_info, branch)
    }
}

/// Parses `KEY=VALUE` lines; blank lines, `#` comments and `export ` prefixes
/// are ignored and surrounding quotes are stripped.
pub fn parse_env_file(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// `<prefix>-<describe>`, plus `-<branch>` for unpublished branches.
pub fn build_name(
    prefix: &str,
    version_info: &BTreeMap<String, String>,
    branch: &str,
) -> Result<String> {
    let key = format!("{APP_COMPONENT}.{DESCRIBE_KEY}");
    let describe = version_info
        .get(&key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Metadata(format!("{key} missing from version information")))?;

    let mut name = format!("{prefix}-{describe}");
    if !is_published_branch(branch) {
        name.push('-');
        name.push_str(&branch.replace(['/', '\\', ' '], "-"));
    }
    Ok(name)
}

/// Extracts `3.1.1` from descriptions like `OpenShot-v3.1.1-18-ga01a98c`.
///
/// A description without a `v<version>` part is a precondition violation.
pub fn extract_version(description: &str) -> Result<String> {
    let pattern = Regex::new(VERSION_PATTERN)
        .map_err(|e| Error::Metadata(format!("invalid version pattern: {e}")))?;
    pattern
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::Metadata(format!(
                "build description '{description}' does not contain a v<version> tag"
            ))
        })
}

/// Path of a component's env file below an install directory.
pub fn env_file_path(install_dir: &Path, component: &str) -> PathBuf {
    install_dir.join("share").join(format!("{component}.env"))
}
