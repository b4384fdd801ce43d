//! macOS DMG disk image packager.
//!
//! The app bundle, signing, notarization and `hdiutil` all happen inside
//! `installer/build-mac-dmg.sh`. This packager runs the script, judges its
//! output and moves the resulting disk image to the artifact path.

use crate::bundler::artifact::{Artifact, remove_partial};
use crate::bundler::tool::{LineRule, OutcomeInterpreter, ToolCommand, ToolOutcome};
use crate::context::BuildContext;
use crate::error::{Error, ErrorExt, Result};
use crate::session::Session;
use crate::settings::Settings;
use std::path::{Path, PathBuf};

/// Printed by the script once the image is complete.
const IMAGE_READY: &str = "Your image is ready";

const DMG_RULES: &[LineRule] = &[
    LineRule::token_unless("error", "No errors"),
    LineRule::token("rejected"),
];

const DMG_OUTCOME: OutcomeInterpreter = OutcomeInterpreter::Scan {
    rules: DMG_RULES,
    sentinel: Some(IMAGE_READY),
};

/// Builds `<build-name>-x86_64.dmg`.
#[derive(Debug, Clone)]
pub struct MacPackager {
    settings: Settings,
}

impl MacPackager {
    /// Creates the packager.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Runs the disk image script from the project root.
    pub async fn package(
        &self,
        ctx: &BuildContext,
        session: &mut Session,
    ) -> Result<Option<Artifact>> {
        let tools = self.settings.tools();
        let build_dir = self.settings.build_dir();
        let artifact_path = build_dir.join(ctx.artifact_name());

        let output = ToolCommand::new(tools.bash.as_str())
            .path_arg(&tools.mac_dmg_script)
            .current_dir(self.settings.project_root())
            .run(session)
            .await?;

        let outcome = DMG_OUTCOME.interpret(&output);
        if let ToolOutcome::Failed(lines) = &outcome {
            for line in lines {
                session.record(format!("Build-Mac-DMG Error: {line}"));
            }
        }

        // Consistent naming with the other installers
        for dmg in find_disk_images(&build_dir)? {
            session.output(format!("Renaming {} to {}", dmg.display(), artifact_path.display()));
            tokio::fs::rename(&dmg, &artifact_path)
                .await
                .fs_context("renaming disk image", &dmg)?;
        }

        if outcome.is_success() && session.ledger().is_empty() && artifact_path.is_file() {
            let artifact = Artifact::from_file(&artifact_path).await?;
            return Ok(Some(artifact));
        }

        session.record(format!("Build-Mac-DMG Error: Did not output '{IMAGE_READY}'"));
        remove_partial(&artifact_path, session).await?;
        Ok(None)
    }
}

/// Regular `*.dmg` files directly inside `dir`, sorted by path.
fn find_disk_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.dmg",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::Other(anyhow::anyhow!("invalid disk image pattern: {e}")))?;

    let mut images: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    images.sort();
    Ok(images)
}
