//! Publication of installers to the hosted release.
//!
//! Uploads replace any same-named asset first, so running the publisher
//! twice leaves exactly one copy of each file.

pub mod github;
pub mod retry;
pub mod torrent;

pub use github::{Asset, GitHubReleases, Release, ReleaseHost};
pub use retry::{Backoff, RetryExhausted, RetryPolicy};

use crate::bundler::Artifact;
use crate::error::{Error, ErrorExt, Result};
use crate::session::Session;
use crate::settings::Settings;
use bytes::Bytes;
use std::path::Path;

/// Uploads files to one release host.
pub struct Publisher<'a> {
    host: &'a dyn ReleaseHost,
    policy: RetryPolicy,
}

impl<'a> Publisher<'a> {
    /// Creates a publisher retrying each upload under `policy`.
    pub fn new(host: &'a dyn ReleaseHost, policy: RetryPolicy) -> Self {
        Self { host, policy }
    }

    /// Looks up the release receiving this run's assets.
    pub async fn release(&self, tag: &str) -> Result<Release> {
        self.host.release_by_tag(tag).await
    }

    /// Uploads `path` to `release` and returns its download URL.
    ///
    /// Same-named assets are deleted first and `release.assets` is kept in
    /// sync with the host.
    pub async fn upload(
        &self,
        path: &Path,
        release: &mut Release,
        session: &mut Session,
    ) -> Result<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Metadata(format!("no file name in {}", path.display())))?;

        let conflicting: Vec<Asset> = release
            .assets
            .iter()
            .filter(|asset| asset.name == name)
            .cloned()
            .collect();
        for asset in &conflicting {
            session.output(format!(
                "GitHub: Removing conflicting installer asset from {}: {}",
                release.tag_name, name
            ));
            self.host.delete_asset(asset).await?;
        }
        release.assets.retain(|asset| asset.name != name);

        let content = Bytes::from(tokio::fs::read(path).await.fs_context("reading asset", path)?);
        session.output(format!(
            "GitHub: Uploading asset from {}: {}",
            release.tag_name, name
        ));

        let target: &Release = release;
        let uploaded = retry::retry(
            &self.policy,
            |attempt| {
                log::debug!("Uploading {} (attempt {})", name, attempt);
                self.host.upload_asset(target, &name, content.clone())
            },
            |attempt, e| {
                log::warn!("Upload attempt {} of {} failed: {}", attempt, name, e);
                session.output("Upload failed... trying again");
            },
        )
        .await
        .map_err(|exhausted| Error::UploadFailed {
            path: path.to_path_buf(),
            attempts: exhausted.attempts,
            source: Box::new(exhausted.last),
        })?;

        let url = uploaded.browser_download_url.clone();
        release.assets.push(uploaded);
        Ok(url)
    }

    /// Uploads the installer, then creates and uploads its torrent.
    ///
    /// Returns the installer's download URL. A torrent failure is recorded
    /// and does not fail publication.
    pub async fn publish(
        &self,
        settings: &Settings,
        artifact: &Artifact,
        version: &str,
        release: &mut Release,
        session: &mut Session,
    ) -> Result<String> {
        session.output(format!(
            "GitHub: Uploading {} to GitHub Release: {}",
            artifact.path().display(),
            release.tag_name
        ));
        let download_url = self.upload(artifact.path(), release, session).await?;

        if let Some(torrent) =
            torrent::create_torrent(settings, artifact, version, &download_url, session).await?
        {
            self.upload(&torrent, release, session).await?;
        }

        Ok(download_url)
    }
}
