//! Zulip chat transport.

use super::Notifier;
use crate::bundler::utils::http;
use crate::error::{Error, ErrorExt, Result};
use crate::settings::ChatSettings;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use url::Url;

const SERVICE: &str = "Zulip";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    uri: String,
}

/// Posts to a Zulip stream as the build bot.
pub struct ZulipNotifier {
    client: Client,
    api_url: String,
    bot_email: String,
    token: String,
    stream: String,
}

impl std::fmt::Debug for ZulipNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZulipNotifier")
            .field("api_url", &self.api_url)
            .field("bot_email", &self.bot_email)
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl ZulipNotifier {
    /// Creates a notifier authenticating with the bot's API `token`.
    pub fn new(settings: &ChatSettings, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            bot_email: settings.bot_email.clone(),
            token: token.into(),
            stream: settings.stream.clone(),
        })
    }

    /// Resolves an upload `uri` (usually server-relative) to an absolute URL.
    pub fn absolute_uri(&self, uri: &str) -> String {
        resolve_uri(&self.api_url, uri)
    }
}

/// Joins a server-relative `uri` onto the host of `api_url`.
///
/// Absolute URIs and unparsable inputs are returned unchanged.
pub fn resolve_uri(api_url: &str, uri: &str) -> String {
    if uri.is_empty() {
        return String::new();
    }
    Url::parse(api_url)
        .and_then(|base| base.join(uri))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| uri.to_string())
}

#[async_trait]
impl Notifier for ZulipNotifier {
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String> {
        let content = tokio::fs::read(path).await.fs_context("reading build log", path)?;
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("text/plain")?;
        let form = Form::new().part(file_name.to_string(), part);

        let response = self
            .client
            .post(format!("{}/user_uploads", self.api_url))
            .basic_auth(&self.bot_email, Some(&self.token))
            .multipart(form)
            .send()
            .await?;
        let response = http::check(SERVICE, response).await?;
        let body: UploadResponse = response.json().await?;
        if body.uri.is_empty() {
            return Err(Error::Api {
                service: SERVICE,
                status: 200,
                body: "upload response carried no uri".into(),
            });
        }
        Ok(self.absolute_uri(&body.uri))
    }

    async fn post_message(&self, topic: &str, content: &str) -> Result<()> {
        let params = [
            ("type", "stream"),
            ("to", self.stream.as_str()),
            ("subject", topic),
            ("content", content),
        ];
        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .basic_auth(&self.bot_email, Some(&self.token))
            .form(&params)
            .send()
            .await?;
        http::check(SERVICE, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_upload_uris_are_resolved() {
        assert_eq!(
            resolve_uri(
                "https://openshot.zulipchat.com/api/v1",
                "/user_uploads/2/ab/Linux-build-server.txt"
            ),
            "https://openshot.zulipchat.com/user_uploads/2/ab/Linux-build-server.txt"
        );
        assert_eq!(
            resolve_uri("https://openshot.zulipchat.com/api/v1", "https://cdn.example/log.txt"),
            "https://cdn.example/log.txt"
        );
        assert_eq!(resolve_uri("https://openshot.zulipchat.com/api/v1", ""), "");
    }
}
