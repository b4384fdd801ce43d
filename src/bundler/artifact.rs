//! The installer file produced by a packager.

use crate::error::{Error, ErrorExt, Result};
use crate::session::Session;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// A finished installer on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    name: String,
    size: u64,
    sha256: String,
}

impl Artifact {
    /// Inspects the installer at `path`, computing its size and digest.
    ///
    /// Fails if `path` is not a regular file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .fs_context("reading artifact metadata", path)?;
        if !metadata.is_file() {
            return Err(Error::Metadata(format!(
                "artifact is not a regular file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Metadata(format!("artifact has no file name: {}", path.display())))?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            sha256: calculate_sha256(path).await?,
        })
    }

    /// Location of the installer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, which is also the asset name on the release host.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hex-encoded SHA-256 digest.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Writes the artifact summary to the run log.
    pub fn log_summary(&self, session: &mut Session) {
        session.output(format!(
            "Artifact: {} ({} bytes, sha256 {})",
            self.path.display(),
            self.size,
            self.sha256
        ));
    }
}

/// SHA-256 of a file, read in 8 KiB chunks.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Deletes a partial artifact after a failed packaging step.
///
/// A missing file is not an error.
pub async fn remove_partial(path: &Path, session: &mut Session) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            session.output(format!("Removed partial artifact {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing partial artifact", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn digest_and_size_of_installer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OpenShot-v3.1.1-x86_64.AppImage");
        std::fs::write(&path, b"abc").unwrap();

        let artifact = Artifact::from_file(&path).await.unwrap();
        assert_eq!(artifact.name(), "OpenShot-v3.1.1-x86_64.AppImage");
        assert_eq!(artifact.size(), 3);
        assert_eq!(
            artifact.sha256(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn directories_are_not_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Artifact::from_file(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn removing_missing_partial_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::create(&dir.path().join("log")).unwrap();
        let path = dir.path().join("OpenShot.dmg");

        remove_partial(&path, &mut session).await.unwrap();
        std::fs::write(&path, b"partial").unwrap();
        remove_partial(&path, &mut session).await.unwrap();
        assert!(!path.exists());
    }
}
