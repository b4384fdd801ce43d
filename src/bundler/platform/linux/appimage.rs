//! AppImage packager - portable Linux applications.
//!
//! Assembles `build/OpenShot.AppDir` from the frozen tree and the
//! freedesktop assets in `xdg/`, then hands it to `AppImageAssistant`.
//!
//! # AppDir layout
//!
//! ```text
//! OpenShot.AppDir/
//! ├── AppRun                      (from AppImageKit)
//! ├── .DirIcon                    (256 px PNG)
//! ├── openshot-qt.svg
//! ├── openshot-qt.desktop         (Exec= rewritten to the wrapper)
//! └── usr/
//!     ├── bin/                    (frozen build)
//!     │   ├── openshot-qt-launch          (was launch-linux.sh)
//!     │   └── openshot-qt-launch.wrapper  (desktop integration)
//!     └── share/
//!         ├── icons/hicolor/<size>/apps/
//!         ├── mime/packages/openshot-qt.xml
//!         └── pixmaps/
//! ```

use crate::bundler::artifact::{Artifact, remove_partial};
use crate::bundler::tool::{LineRule, OutcomeInterpreter, ToolCommand};
use crate::bundler::utils::fs;
use crate::context::BuildContext;
use crate::error::{Error, ErrorExt, Result};
use crate::session::Session;
use crate::settings::Settings;
use std::path::{Path, PathBuf};

/// Name of the assembled AppDir below the build directory.
const APP_DIR_NAME: &str = "OpenShot.AppDir";

/// Base name of icons, the desktop entry and the MIME file.
const ICON_NAME: &str = "openshot-qt";

/// Prefix of the frozen output directory, e.g. `exe.linux-x86_64-3.8`.
const FROZEN_DIR_PREFIX: &str = "exe.linux";

/// Command line written into every `Exec=` line of the desktop entry.
const WRAPPER_EXEC: &str = "Exec=openshot-qt-launch.wrapper %F";

/// Recorded when no AppImage came out of the assistant.
const APPIMAGE_ERROR: &str = "AppImageKit Error: AppImageAssistant did not output the AppImage file";

const ASSISTANT_RULES: &[LineRule] = &[
    LineRule::token_unless("error", "No errors"),
    LineRule::token("Error"),
];

const ASSISTANT_OUTCOME: OutcomeInterpreter = OutcomeInterpreter::Scan {
    rules: ASSISTANT_RULES,
    sentinel: None,
};

/// Hicolor icon sizes and their sources below `xdg/`.
const ICONS: [(&str, &str); 5] = [
    ("scalable", "openshot-qt.svg"),
    ("64x64", "icon/64/openshot-qt.png"),
    ("128x128", "icon/128/openshot-qt.png"),
    ("256x256", "icon/256/openshot-qt.png"),
    ("512x512", "icon/512/openshot-qt.png"),
];

/// Builds `<build-name>-x86_64.AppImage`.
#[derive(Debug, Clone)]
pub struct LinuxPackager {
    settings: Settings,
}

impl LinuxPackager {
    /// Creates the packager.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Assembles the AppDir and runs `AppImageAssistant`.
    pub async fn package(
        &self,
        ctx: &BuildContext,
        session: &mut Session,
    ) -> Result<Option<Artifact>> {
        let artifact_path = self.settings.build_dir().join(ctx.artifact_name());
        let app_dir = self.assemble_app_dir(session).await?;

        let assistant = self
            .settings
            .resolve(&self.settings.tools().appimagekit_dir)
            .join("AppImageAssistant");
        let output = ToolCommand::new(assistant.to_string_lossy())
            .path_arg(&app_dir)
            .path_arg(&artifact_path)
            .run(session)
            .await?;

        let outcome = ASSISTANT_OUTCOME.interpret(&output);
        let exit = OutcomeInterpreter::ExitCode.interpret(&output);
        for verdict in [&outcome, &exit] {
            if !verdict.is_success() {
                log::warn!("AppImageAssistant reported: {}", verdict.detail());
            }
        }

        let clean = outcome.is_success() && exit.is_success();
        if clean && artifact_path.is_file() && session.ledger().is_empty() {
            let artifact = Artifact::from_file(&artifact_path).await?;
            return Ok(Some(artifact));
        }

        session.record(APPIMAGE_ERROR);
        remove_partial(&artifact_path, session).await?;
        Ok(None)
    }

    /// Lays out `build/OpenShot.AppDir`, replacing any previous one.
    pub async fn assemble_app_dir(&self, session: &mut Session) -> Result<PathBuf> {
        let build_dir = self.settings.build_dir();
        let xdg_dir = self.settings.project_root().join("xdg");
        let kit_dir = self.settings.resolve(&self.settings.tools().appimagekit_dir);
        let app_dir = build_dir.join(APP_DIR_NAME);

        if fs::remove_path(&app_dir).await? {
            log::debug!("Removed previous {}", app_dir.display());
        }
        session.output(format!("Assembling {}", app_dir.display()));

        let usr_dir = app_dir.join("usr");
        let share_dir = usr_dir.join("share");
        let bin_dir = usr_dir.join("bin");

        // Desktop icons
        let hicolor = share_dir.join("icons").join("hicolor");
        for (size, source) in ICONS {
            let source = xdg_dir.join(source);
            let file_name = source
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(ICON_NAME));
            fs::copy_file(&source, &hicolor.join(size).join("apps").join(file_name)).await?;
        }

        let svg_icon = xdg_dir.join(ICONS[0].1);
        let png_64 = xdg_dir.join(ICONS[1].1);
        fs::copy_file(&xdg_dir.join(ICONS[3].1), &app_dir.join(".DirIcon")).await?;
        fs::copy_file(&svg_icon, &app_dir.join(format!("{ICON_NAME}.svg"))).await?;

        let pixmaps = share_dir.join("pixmaps");
        fs::copy_file(&svg_icon, &pixmaps.join(format!("{ICON_NAME}.svg"))).await?;
        fs::copy_file(&png_64, &pixmaps.join(format!("{ICON_NAME}.png"))).await?;

        // MIME registration
        fs::copy_file(
            &xdg_dir.join("org.openshot.OpenShot.xml"),
            &share_dir.join("mime").join("packages").join(format!("{ICON_NAME}.xml")),
        )
        .await?;

        // Frozen application
        let frozen_dir = find_frozen_dir(&build_dir)?;
        session.output(format!("Copying {} to {}", frozen_dir.display(), bin_dir.display()));
        fs::copy_dir(&frozen_dir, &bin_dir).await?;

        // Desktop entry
        let desktop_in = xdg_dir.join("org.openshot.OpenShot.desktop");
        let desktop_out = app_dir.join(format!("{ICON_NAME}.desktop"));
        let entry = tokio::fs::read_to_string(&desktop_in)
            .await
            .fs_context("reading desktop entry", &desktop_in)?;
        tokio::fs::write(&desktop_out, rewrite_desktop_entry(&entry))
            .await
            .fs_context("writing desktop entry", &desktop_out)?;

        // Launchers
        let launcher = bin_dir.join("openshot-qt-launch");
        let launch_script = bin_dir.join("launch-linux.sh");
        tokio::fs::rename(&launch_script, &launcher)
            .await
            .fs_context("renaming launcher", &launch_script)?;

        let wrapper = bin_dir.join("openshot-qt-launch.wrapper");
        fs::copy_file(&kit_dir.join("desktopintegration"), &wrapper).await?;

        let app_run = app_dir.join("AppRun");
        fs::copy_file(&kit_dir.join("AppRun"), &app_run).await?;

        for path in [&app_run, &wrapper, &launcher] {
            fs::add_exec_bit(path).await?;
        }

        Ok(app_dir)
    }
}

/// Replaces every `Exec=` line with the desktop-integration wrapper.
pub fn rewrite_desktop_entry(contents: &str) -> String {
    contents
        .split_inclusive('\n')
        .map(|line| {
            if line.starts_with("Exec=") {
                let ending = if line.ends_with("\r\n") {
                    "\r\n"
                } else if line.ends_with('\n') {
                    "\n"
                } else {
                    ""
                };
                format!("{WRAPPER_EXEC}{ending}")
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// First `exe.linux*` directory in the build directory, by name.
fn find_frozen_dir(build_dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(build_dir)
        .fs_context("listing build directory", build_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(FROZEN_DIR_PREFIX))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        Error::Other(anyhow::anyhow!(
            "no frozen build ({FROZEN_DIR_PREFIX}*) in {}",
            build_dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SettingsBuilder, ToolSettings};

    #[test]
    fn exec_lines_point_at_wrapper() {
        let entry = "[Desktop Entry]\nName=OpenShot\nExec=openshot-qt %F\nTryExec=openshot-qt\n\n[Desktop Action New]\nExec=openshot-qt --new\n";
        assert_eq!(
            rewrite_desktop_entry(entry),
            "[Desktop Entry]\nName=OpenShot\nExec=openshot-qt-launch.wrapper %F\nTryExec=openshot-qt\n\n[Desktop Action New]\nExec=openshot-qt-launch.wrapper %F\n"
        );
    }

    #[test]
    fn exec_without_trailing_newline() {
        assert_eq!(rewrite_desktop_entry("Exec=x"), WRAPPER_EXEC);
    }

    fn seed_project(root: &Path, kit: &Path) {
        let xdg = root.join("xdg");
        for (_, source) in ICONS {
            let path = xdg.join(source);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, source).unwrap();
        }
        std::fs::write(xdg.join("org.openshot.OpenShot.xml"), "<mime-info/>").unwrap();
        std::fs::write(
            xdg.join("org.openshot.OpenShot.desktop"),
            "[Desktop Entry]\nExec=openshot-qt %F\n",
        )
        .unwrap();

        let frozen = root.join("build/exe.linux-x86_64-3.8");
        std::fs::create_dir_all(frozen.join("lib")).unwrap();
        std::fs::write(frozen.join("launch-linux.sh"), "#!/bin/sh\n").unwrap();
        std::fs::write(frozen.join("openshot-qt"), "elf").unwrap();

        std::fs::create_dir_all(kit).unwrap();
        std::fs::write(kit.join("AppRun"), "#!/bin/sh\n").unwrap();
        std::fs::write(kit.join("desktopintegration"), "#!/bin/sh\n").unwrap();
    }

    #[tokio::test]
    async fn app_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("openshot-qt");
        let kit = dir.path().join("AppImageKit");
        seed_project(&root, &kit);

        let settings = SettingsBuilder::new()
            .project_root(&root)
            .tools(ToolSettings {
                appimagekit_dir: kit.clone(),
                ..Default::default()
            })
            .build()
            .unwrap();
        let mut session = Session::create(&settings.log_path()).unwrap();

        let packager = LinuxPackager::new(settings);
        let app_dir = packager.assemble_app_dir(&mut session).await.unwrap();

        for expected in [
            "AppRun",
            ".DirIcon",
            "openshot-qt.svg",
            "openshot-qt.desktop",
            "usr/bin/openshot-qt",
            "usr/bin/openshot-qt-launch",
            "usr/bin/openshot-qt-launch.wrapper",
            "usr/share/icons/hicolor/scalable/apps/openshot-qt.svg",
            "usr/share/icons/hicolor/512x512/apps/openshot-qt.png",
            "usr/share/pixmaps/openshot-qt.png",
            "usr/share/pixmaps/openshot-qt.svg",
            "usr/share/mime/packages/openshot-qt.xml",
        ] {
            assert!(app_dir.join(expected).exists(), "missing {expected}");
        }
        assert!(!app_dir.join("usr/bin/launch-linux.sh").exists());
        assert_eq!(
            std::fs::read_to_string(app_dir.join(".DirIcon")).unwrap(),
            "icon/256/openshot-qt.png"
        );
        assert_eq!(
            std::fs::read_to_string(app_dir.join("usr/share/pixmaps/openshot-qt.png")).unwrap(),
            "icon/64/openshot-qt.png"
        );
        assert!(
            std::fs::read_to_string(app_dir.join("openshot-qt.desktop"))
                .unwrap()
                .contains(WRAPPER_EXEC)
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(app_dir.join("AppRun")).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_assistant_exit_fails_packaging() {
        use crate::bundler::Platform;
        use crate::settings::Arch;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("openshot-qt");
        let kit = dir.path().join("AppImageKit");
        seed_project(&root, &kit);
        let assistant = kit.join("AppImageAssistant");
        std::fs::write(&assistant, "#!/bin/sh\nprintf 'AppImage' > \"$2\"\nexit 2\n").unwrap();
        std::fs::set_permissions(&assistant, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = SettingsBuilder::new()
            .project_root(&root)
            .tools(ToolSettings {
                appimagekit_dir: kit.clone(),
                ..Default::default()
            })
            .build()
            .unwrap();
        let mut session = Session::create(&settings.log_path()).unwrap();
        let ctx = BuildContext::new(
            Platform::Linux,
            Arch::X86_64,
            "develop",
            Default::default(),
            "OpenShot-v3.1.1",
            "3.1.1",
        );
        let artifact_path = settings.build_dir().join(ctx.artifact_name());

        let artifact = LinuxPackager::new(settings)
            .package(&ctx, &mut session)
            .await
            .unwrap();

        assert!(artifact.is_none());
        assert_eq!(session.ledger().first(), Some(APPIMAGE_ERROR));
        assert!(!artifact_path.exists());
    }

    #[tokio::test]
    async fn missing_frozen_tree_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("build/install-x64")).unwrap();
        assert!(find_frozen_dir(&dir.path().join("build")).is_err());
    }
}
