//! Shared fixtures: fake services and a scratch project tree.

#![allow(dead_code)]

use async_trait::async_trait;
use build_server::error::{Error, Result};
use build_server::notify::Notifier;
use build_server::publish::{Asset, Release, ReleaseHost};
use build_server::settings::{Settings, SettingsBuilder, ToolSettings};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Build description written into the fixture's version file.
pub const DESCRIBE: &str = "v3.1.1-18-ga01a98c";

/// Name of the AppImage built from the fixture on `develop`.
pub const APPIMAGE_NAME: &str = "OpenShot-v3.1.1-18-ga01a98c-x86_64.AppImage";

#[derive(Debug, Default)]
struct HostState {
    assets: Vec<Asset>,
    next_id: u64,
    upload_calls: u32,
    deleted: Vec<String>,
    failures_left: u32,
}

/// In-memory release host.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    /// Host whose first `count` uploads fail.
    pub fn failing(count: u32) -> Self {
        let host = Self::default();
        host.state.lock().unwrap().failures_left = count;
        host
    }

    /// Pre-existing asset on the release.
    pub fn with_asset(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.assets.push(Asset {
                id,
                name: name.to_string(),
                browser_download_url: format!("https://stale.example/{name}"),
            });
        }
        self
    }

    pub fn asset_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    pub fn upload_calls(&self) -> u32 {
        self.state.lock().unwrap().upload_calls
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl ReleaseHost for FakeHost {
    async fn release_by_tag(&self, tag: &str) -> Result<Release> {
        Ok(Release {
            id: 1,
            tag_name: tag.to_string(),
            upload_url: "https://uploads.example/releases/1/assets{?name,label}".into(),
            assets: self.state.lock().unwrap().assets.clone(),
        })
    }

    async fn delete_asset(&self, asset: &Asset) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.assets.retain(|a| a.id != asset.id);
        state.deleted.push(asset.name.clone());
        Ok(())
    }

    async fn upload_asset(&self, _release: &Release, name: &str, _content: Bytes) -> Result<Asset> {
        let mut state = self.state.lock().unwrap();
        state.upload_calls += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(Error::Api {
                service: "GitHub",
                status: 502,
                body: "bad gateway".into(),
            });
        }
        state.next_id += 1;
        let asset = Asset {
            id: state.next_id,
            name: name.to_string(),
            browser_download_url: format!("https://downloads.example/daily/{name}"),
        };
        state.assets.push(asset.clone());
        Ok(asset)
    }
}

/// A posted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub topic: String,
    pub content: String,
}

/// In-memory chat transport that keeps uploaded logs.
#[derive(Debug, Default)]
pub struct FakeNotifier {
    uploads: Mutex<Vec<(String, String)>>,
    messages: Mutex<Vec<Posted>>,
}

impl FakeNotifier {
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Posted> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String> {
        let content = std::fs::read_to_string(path)?;
        self.uploads
            .lock()
            .unwrap()
            .push((file_name.to_string(), content));
        Ok(format!("/user_uploads/1/{file_name}"))
    }

    async fn post_message(&self, topic: &str, content: &str) -> Result<()> {
        self.messages.lock().unwrap().push(Posted {
            topic: topic.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}

/// Writes an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn touch(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// `mktorrent` stand-in that writes the `-o` file and reports success.
pub const MKTORRENT_OK: &str = r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "Hashing $out"
printf 'd8:announce' > "$out"
echo "Writing metainfo file... done."
"#;

/// `AppImageAssistant` stand-in that writes its second argument.
pub const ASSISTANT_OK: &str = r#"echo "Creating AppImage from $1"
printf 'AppImage' > "$2"
"#;

/// `AppImageAssistant` stand-in that fails after a partial write.
pub const ASSISTANT_FAILS: &str = r#"printf 'partial' > "$2"
echo "error: mksquashfs failed"
exit 1
"#;

/// `mktorrent` stand-in that refuses to overwrite its output.
pub const MKTORRENT_FAILS: &str = "echo \"file exists\"\n";

/// `verpatch` stand-in that complains about the launcher.
pub const VERPATCH_FAILS: &str = "echo \"verpatch: cannot open $1\"\n";

/// `iscc` stand-in that quietly writes `Output/OpenShot.exe` next to the
/// script given as its last argument.
pub const ISCC_OK: &str = r#"for script; do :; done
out="$(dirname "$script")/Output"
mkdir -p "$out"
printf 'MZ' > "$out/OpenShot.exe"
"#;

/// Name of the 64-bit Windows installer built from the fixture on `develop`.
pub const INSTALLER_NAME: &str = "OpenShot-v3.1.1-18-ga01a98c-x86_64.exe";

/// Seeds the build metadata read by the version lookup.
fn seed_version_files(root: &Path) {
    let share = root.join("build/install-x64/share");
    touch(&share.join("openshot-qt.env"), &format!("GIT_DESCRIBE={DESCRIBE}\n"));
    touch(&share.join("libopenshot.env"), "GIT_DESCRIBE=v0.3.2-4-g1234\n");
}

/// Scratch checkout of the application with frozen Linux output.
pub struct LinuxProject {
    pub dir: TempDir,
    pub root: PathBuf,
    pub kit: PathBuf,
    pub mktorrent: PathBuf,
}

impl LinuxProject {
    /// Seeds xdg assets, frozen tree, version files and tool stand-ins.
    #[cfg(unix)]
    pub fn new(assistant: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("openshot-qt");
        let kit = dir.path().join("AppImageKit");
        let mktorrent = dir.path().join("bin/mktorrent");

        let xdg = root.join("xdg");
        touch(&xdg.join("openshot-qt.svg"), "<svg/>");
        for size in ["64", "128", "256", "512"] {
            touch(&xdg.join(format!("icon/{size}/openshot-qt.png")), size);
        }
        touch(&xdg.join("org.openshot.OpenShot.xml"), "<mime-info/>");
        touch(
            &xdg.join("org.openshot.OpenShot.desktop"),
            "[Desktop Entry]\nName=OpenShot Video Editor\nExec=openshot-qt %F\n",
        );

        let frozen = root.join("build/exe.linux-x86_64-3.8");
        touch(&frozen.join("openshot-qt"), "elf");
        touch(&frozen.join("launch-linux.sh"), "#!/bin/sh\n");

        seed_version_files(&root);

        touch(&kit.join("AppRun"), "#!/bin/sh\n");
        touch(&kit.join("desktopintegration"), "#!/bin/sh\n");
        write_script(&kit.join("AppImageAssistant"), assistant);
        write_script(&mktorrent, MKTORRENT_OK);

        Self {
            dir,
            root,
            kit,
            mktorrent,
        }
    }

    pub fn settings(&self) -> Settings {
        SettingsBuilder::new()
            .project_root(&self.root)
            .tools(ToolSettings {
                appimagekit_dir: self.kit.clone(),
                mktorrent: self.mktorrent.to_string_lossy().into_owned(),
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root.join("build").join(APPIMAGE_NAME)
    }
}

/// Scratch checkout with frozen Windows output and an MSYS2 toolchain.
pub struct WindowsProject {
    pub dir: TempDir,
    pub root: PathBuf,
    pub msys: PathBuf,
    pub support: PathBuf,
    pub bin: PathBuf,
}

impl WindowsProject {
    /// Seeds the frozen tree, Qt plugins, support files and tool stand-ins.
    #[cfg(unix)]
    pub fn new(verpatch: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("openshot-qt");
        let msys = dir.path().join("msys64");
        let support = dir.path().join("InnoSetup");
        let bin = dir.path().join("bin");

        let frozen = root.join("build/exe.mingw-3.7");
        touch(&frozen.join("openshot-qt.exe"), "MZ");
        touch(&frozen.join("Qt5Cored.dll"), "debug");
        touch(&root.join("installer/windows-installer.iss"), "[Setup]\n");
        seed_version_files(&root);

        let plugins = msys.join("mingw64/share/qt5/plugins");
        touch(&plugins.join("imageformats/qjpeg.dll"), "");
        touch(&plugins.join("platforms/qwindows.dll"), "");
        touch(&support.join("unins000.dat"), "");

        write_script(&bin.join("verpatch"), verpatch);
        write_script(&bin.join("iscc"), ISCC_OK);

        Self {
            dir,
            root,
            msys,
            support,
            bin,
        }
    }

    pub fn settings(&self) -> Settings {
        let tool = |name: &str| self.bin.join(name).to_string_lossy().into_owned();
        SettingsBuilder::new()
            .project_root(&self.root)
            .tools(ToolSettings {
                msys_root: self.msys.clone(),
                innosetup_support_dir: self.support.clone(),
                verpatch: tool("verpatch"),
                iscc: tool("iscc"),
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root.join("build").join(INSTALLER_NAME)
    }
}
