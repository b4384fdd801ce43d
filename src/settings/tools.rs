//! Locations of the external packaging tools.

use serde::Deserialize;
use std::path::PathBuf;

/// External tool locations.
///
/// Relative paths are resolved against the project root. Program names
/// without a directory are looked up on `PATH` at launch time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Directory holding `AppImageAssistant`, `AppRun` and `desktopintegration`.
    pub appimagekit_dir: PathBuf,

    /// Shell used to run the disk image script.
    pub bash: String,

    /// Disk image build script (macOS).
    pub mac_dmg_script: PathBuf,

    /// MSYS2 installation root holding `mingw64/` and `mingw32/`.
    pub msys_root: PathBuf,

    /// Python ABI tag of the frozen tree, e.g. `3.7` in `exe.mingw-3.7`.
    pub python_abi: String,

    /// Directory whose files are copied next to the installer script.
    pub innosetup_support_dir: PathBuf,

    /// Inno Setup script.
    pub inno_script: PathBuf,

    /// Version resource patcher.
    pub verpatch: String,

    /// Inno Setup compiler.
    pub iscc: String,

    /// Code signing tool.
    pub ksign: String,

    /// Peer-distribution file generator.
    pub mktorrent: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            appimagekit_dir: PathBuf::from("/home/ubuntu/apps/AppImageKit"),
            bash: "bash".into(),
            mac_dmg_script: PathBuf::from("installer/build-mac-dmg.sh"),
            msys_root: PathBuf::from("C:\\msys64"),
            python_abi: "3.7".into(),
            innosetup_support_dir: PathBuf::from("c:/InnoSetup"),
            inno_script: PathBuf::from("installer/windows-installer.iss"),
            verpatch: "verpatch.exe".into(),
            iscc: "iscc.exe".into(),
            ksign: "kSignCMD.exe".into(),
            mktorrent: "mktorrent".into(),
        }
    }
}

impl ToolSettings {
    /// Name of the frozen output directory on Windows (`exe.mingw-<abi>`).
    pub fn windows_frozen_dir_name(&self) -> String {
        format!("exe.mingw-{}", self.python_abi)
    }
}
