//! Peer-distribution file for an uploaded installer.

use crate::bundler::Artifact;
use crate::bundler::tool::{OutcomeInterpreter, ToolCommand};
use crate::bundler::utils::fs;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::settings::Settings;
use std::path::PathBuf;

/// `mktorrent` ends a successful run with this line.
const METAINFO_WRITTEN: OutcomeInterpreter = OutcomeInterpreter::FinalLine {
    suffix: "Writing metainfo file... done.",
};

/// File name of the torrent for `artifact_name`.
pub fn torrent_name(artifact_name: &str) -> String {
    format!("{artifact_name}.torrent")
}

/// Creates `<artifact>.torrent` next to the installer, with `download_url`
/// as its web seed.
///
/// Returns `Ok(None)` after recording a failure when `mktorrent` could not
/// be started or did not finish writing the file.
pub async fn create_torrent(
    settings: &Settings,
    artifact: &Artifact,
    version: &str,
    download_url: &str,
    session: &mut Session,
) -> Result<Option<PathBuf>> {
    let build_dir = artifact
        .path()
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.build_dir());
    let name = torrent_name(artifact.name());
    let torrent_path = build_dir.join(&name);

    if fs::remove_path(&torrent_path).await? {
        log::debug!("Removed previous {}", torrent_path.display());
    }

    let run = ToolCommand::new(settings.tools().mktorrent.as_str())
        .args(["-a".to_string(), settings.torrent().trackers.join(", ")])
        .args([
            "-c".to_string(),
            format!("{} {}", settings.product().product_name, version),
        ])
        .args(["-w", download_url])
        .args(["-o", name.as_str()])
        .arg(artifact.name())
        .current_dir(&build_dir)
        .run(session)
        .await;
    let output = match run {
        Ok(output) => output,
        Err(e @ Error::ToolLaunch { .. }) => {
            session.record(format!("Torrent Error: Unexpected output ({e})"));
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let outcome = METAINFO_WRITTEN.interpret(&output);
    if !outcome.is_success() {
        session.record(format!("Torrent Error: Unexpected output ({})", outcome.detail()));
        return Ok(None);
    }

    Ok(Some(torrent_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::settings::{SettingsBuilder, ToolSettings};

    #[tokio::test]
    async fn missing_mktorrent_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .project_root(dir.path())
            .tools(ToolSettings {
                mktorrent: dir.path().join("no-such-mktorrent").to_string_lossy().into_owned(),
                ..Default::default()
            })
            .build()
            .unwrap();
        let installer = settings.build_dir().join("OpenShot-v3.1.1-x86_64.AppImage");
        std::fs::create_dir_all(settings.build_dir()).unwrap();
        std::fs::write(&installer, b"AppImage").unwrap();
        let artifact = Artifact::from_file(&installer).await.unwrap();
        let mut session = Session::create(&settings.log_path()).unwrap();

        let torrent = create_torrent(
            &settings,
            &artifact,
            "3.1.1",
            "https://downloads.example/daily/OpenShot-v3.1.1-x86_64.AppImage",
            &mut session,
        )
        .await
        .unwrap();

        assert!(torrent.is_none());
        assert_eq!(session.ledger().len(), 1);
        let recorded = session.ledger().first().unwrap();
        assert!(recorded.starts_with("Torrent Error: Unexpected output ("), "{recorded}");
        assert!(recorded.contains("no-such-mktorrent"));
    }

    #[test]
    fn torrent_sits_next_to_artifact() {
        assert_eq!(
            torrent_name("OpenShot-v3.1.1-x86_64.AppImage"),
            "OpenShot-v3.1.1-x86_64.AppImage.torrent"
        );
    }
}
