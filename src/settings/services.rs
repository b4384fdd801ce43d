//! Remote service endpoints: release host, chat service, torrent trackers.

use serde::Deserialize;

/// Hosted release configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
    /// REST API root.
    pub api_url: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Tag of the release receiving the assets.
    pub tag: String,
    /// Upload attempts per asset.
    pub upload_attempts: u32,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            owner: "OpenShot".into(),
            repo: "openshot-qt".into(),
            tag: "daily".into(),
            upload_attempts: 3,
        }
    }
}

/// Chat notification configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// API root (`.../api/v1`).
    pub api_url: String,
    /// Bot account used for basic auth.
    pub bot_email: String,
    /// Stream receiving build messages.
    pub stream: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_url: "https://openshot.zulipchat.com/api/v1".into(),
            bot_email: "builder-bot@openshot.zulipchat.com".into(),
            stream: "build-server".into(),
        }
    }
}

/// Peer-distribution file configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TorrentSettings {
    /// Announce URLs written into every torrent.
    pub trackers: Vec<String>,
}

impl Default for TorrentSettings {
    fn default() -> Self {
        Self {
            trackers: vec![
                "udp://tracker.openbittorrent.com:80/announce".into(),
                "udp://tracker.publicbt.com:80/announce".into(),
                "udp://tracker.opentrackr.org:1337".into(),
            ],
        }
    }
}
