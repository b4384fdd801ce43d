//! Immutable per-run facts.

use crate::bundler::Platform;
use crate::settings::Arch;
use std::collections::BTreeMap;

/// Branch whose builds are published as daily builds.
pub const DEFAULT_BRANCH: &str = "develop";

/// Facts resolved once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct BuildContext {
    platform: Platform,
    arch: Arch,
    branch: String,
    version_info: BTreeMap<String, String>,
    build_name: String,
    version: String,
}

impl BuildContext {
    /// Assembles a context from resolved metadata.
    pub fn new(
        platform: Platform,
        arch: Arch,
        branch: impl Into<String>,
        version_info: BTreeMap<String, String>,
        build_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            arch,
            branch: branch.into(),
            version_info,
            build_name: build_name.into(),
            version: version.into(),
        }
    }

    /// Target platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Target architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Source-control branch being built.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Version information of every upstream component.
    pub fn version_info(&self) -> &BTreeMap<String, String> {
        &self.version_info
    }

    /// Display name of the build, e.g. `OpenShot-v3.1.1-18-ga01a98c`.
    pub fn build_name(&self) -> &str {
        &self.build_name
    }

    /// Bare version number, e.g. `3.1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// File name of the installer: `<build-name>-<arch>.<ext>`.
    pub fn artifact_name(&self) -> String {
        format!(
            "{}-{}",
            self.build_name,
            self.platform.artifact_suffix(self.arch)
        )
    }

    /// Only `develop` and `release*` branches are uploaded as daily builds.
    pub fn is_published_branch(&self) -> bool {
        is_published_branch(&self.branch)
    }
}

/// True for branches whose builds are uploaded.
pub fn is_published_branch(branch: &str) -> bool {
    branch == DEFAULT_BRANCH || branch.starts_with("release")
}
