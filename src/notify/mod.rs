//! Build status notifications.
//!
//! At the end of every run the log is uploaded to the chat service and a
//! one-line summary is posted to the build stream. Transport failures are
//! logged and never recorded as build failures.

pub mod zulip;

pub use zulip::ZulipNotifier;

use crate::bundler::Platform;
use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use std::path::Path;

/// Longest first-error excerpt included in a failure message.
pub const FAILURE_EXCERPT_LEN: usize = 256;

/// Topic for failed builds.
pub const FAILED_TOPIC: &str = "Failed Builds";

/// Topic for successful builds.
pub const SUCCESS_TOPIC: &str = "Successful Builds";

/// Chat transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Uploads a file and returns its URI as understood by the chat service.
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String>;

    /// Posts `content` to the build stream under `topic`.
    async fn post_message(&self, topic: &str, content: &str) -> Result<()>;
}

/// Shortens `message` to `max` characters plus `...` once it reaches `max`.
///
/// Counts characters, not bytes.
pub fn truncate(message: &str, max: usize) -> String {
    if message.chars().count() < max {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(max).collect();
    truncated.push_str("...");
    truncated
}

/// Topic for `comment`: failures are marked with the skull emoji.
pub fn topic_for(comment: &str) -> &'static str {
    if comment.contains("skull") {
        FAILED_TOPIC
    } else {
        SUCCESS_TOPIC
    }
}

/// Comment for a successful build; the URL is left out when nothing was
/// published.
pub fn success_comment(branch: &str, download_url: Option<&str>) -> String {
    match download_url {
        Some(url) => format!("Successful *{branch}* build: {url}"),
        None => format!("Successful *{branch}* build"),
    }
}

/// Comment for a failed build, quoting the first recorded error.
pub fn failure_comment(first_error: &str) -> String {
    format!(
        ":skull_and_crossbones: {}",
        truncate(first_error, FAILURE_EXCERPT_LEN)
    )
}

/// Stream message: `:<platform>: <comment> [Build Log](<uri>)`.
pub fn message_content(platform: Platform, comment: &str, log_uri: &str) -> String {
    format!(
        ":{}: {} [Build Log]({})",
        platform.name().to_lowercase(),
        comment,
        log_uri
    )
}

/// Uploads the run log and posts `comment`.
///
/// The log is flushed before the upload and reopened in append mode
/// afterwards, so later lines still reach the same file.
pub async fn notify(
    notifier: &dyn Notifier,
    platform: Platform,
    title: &str,
    comment: &str,
    session: &mut Session,
) {
    let log_path = session.log_path().to_path_buf();
    session.output(format!("Zulip Upload: {}", log_path.display()));
    log::info!("{}", title);

    if let Err(e) = session.flush_log() {
        log::warn!("Failed to flush run log before upload: {}", e);
    }

    let file_name = format!("{}-build-server.txt", platform.name());
    let log_uri = match notifier.upload_file(&log_path, &file_name).await {
        Ok(uri) => uri,
        Err(e) => {
            log::warn!("Failed to upload build log: {}", e);
            String::new()
        }
    };

    let content = message_content(platform, comment, &log_uri);
    if let Err(e) = notifier.post_message(topic_for(comment), &content).await {
        log::warn!("Failed to post build notification: {}", e);
    }

    if let Err(e) = session.reopen_log() {
        log::warn!("Failed to reopen run log: {}", e);
    }
}
