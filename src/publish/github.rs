//! Hosted release client.

use crate::bundler::utils::http;
use crate::error::{Error, Result};
use crate::settings::ReleaseSettings;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const SERVICE: &str = "GitHub";

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Release id.
    pub id: u64,
    /// Tag the release is attached to.
    pub tag_name: String,
    /// Asset upload URL; may carry a `{?name,label}` template suffix.
    pub upload_url: String,
    /// Assets at lookup time.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// Asset id.
    pub id: u64,
    /// File name.
    pub name: String,
    /// Public download URL.
    pub browser_download_url: String,
}

/// Operations on the release host.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Looks up the release carrying `tag`.
    async fn release_by_tag(&self, tag: &str) -> Result<Release>;

    /// Deletes an asset.
    async fn delete_asset(&self, asset: &Asset) -> Result<()>;

    /// Attaches `content` to `release` as `name`.
    async fn upload_asset(&self, release: &Release, name: &str, content: Bytes) -> Result<Asset>;
}

/// GitHub REST implementation using basic auth.
pub struct GitHubReleases {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    user: String,
    password: String,
}

impl std::fmt::Debug for GitHubReleases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubReleases")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl GitHubReleases {
    /// Creates a client for the configured repository.
    pub fn new(
        settings: &ReleaseSettings,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            user: user.into(),
            password: password.into(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, path)
    }
}

/// Strips the `{?name,label}` template from an upload URL and adds the
/// asset name as a query parameter.
pub fn asset_upload_url(upload_url: &str, name: &str) -> Result<Url> {
    let base = upload_url.split('{').next().unwrap_or(upload_url);
    let mut url = Url::parse(base)
        .map_err(|e| Error::Other(anyhow::anyhow!("invalid upload URL '{upload_url}': {e}")))?;
    url.query_pairs_mut().clear().append_pair("name", name);
    Ok(url)
}

#[async_trait]
impl ReleaseHost for GitHubReleases {
    async fn release_by_tag(&self, tag: &str) -> Result<Release> {
        let response = self
            .client
            .get(self.repo_url(&format!("releases/tags/{tag}")))
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::ReleaseNotFound { tag: tag.into() });
        }
        let response = http::check(SERVICE, response).await?;
        Ok(response.json().await?)
    }

    async fn delete_asset(&self, asset: &Asset) -> Result<()> {
        let response = self
            .client
            .delete(self.repo_url(&format!("releases/assets/{}", asset.id)))
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        http::check(SERVICE, response).await?;
        Ok(())
    }

    async fn upload_asset(&self, release: &Release, name: &str, content: Bytes) -> Result<Asset> {
        let url = asset_upload_url(&release.upload_url, name)?;
        let response = self
            .client
            .post(url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()
            .await?;
        let response = http::check(SERVICE, response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_template_is_stripped() {
        let url = asset_upload_url(
            "https://uploads.github.com/repos/OpenShot/openshot-qt/releases/1/assets{?name,label}",
            "OpenShot-v3.1.1-x86_64.AppImage",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://uploads.github.com/repos/OpenShot/openshot-qt/releases/1/assets?name=OpenShot-v3.1.1-x86_64.AppImage"
        );
    }

    #[test]
    fn release_json_without_assets() {
        let release: Release = serde_json::from_str(
            r#"{"id": 7, "tag_name": "daily", "upload_url": "https://uploads.example/assets{?name}"}"#,
        )
        .unwrap();
        assert_eq!(release.tag_name, "daily");
        assert!(release.assets.is_empty());
    }
}
