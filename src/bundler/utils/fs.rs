//! File system utilities for packaging.
//!
//! Copies create missing parent directories and preserve symlinks. Removal
//! of a path that does not exist is reported to the caller, not an error.

use crate::error::{Error, ErrorExt, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file, creating parent directories of `to` as needed.
///
/// Fails if the source is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::Fs {
            action: "copying file".into(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a regular file"),
        });
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Recursively copies a directory, merging into `to` if it already exists.
///
/// Preserves symlinks on platforms that support them. Fails if the source is
/// not a directory or doesn't exist.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::Fs {
            action: "copying directory".into(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || copy_dir_blocking(&from, &to))
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("directory copy task panicked: {e}")))?
}

fn copy_dir_blocking(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).fs_context("creating directory", to)?;

    for entry in walkdir::WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(|e| Error::Other(e.into()))?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::Other(e.into()))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
            if dest_path.symlink_metadata().is_ok() {
                std::fs::remove_file(&dest_path).fs_context("replacing link", &dest_path)?;
            }
            let linked = if entry.path().is_dir() {
                symlink_dir(&target, &dest_path)
            } else {
                symlink_file(&target, &dest_path)
            };
            linked.fs_context("creating link", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
        }
    }

    Ok(())
}

/// Removes a file or directory tree.
///
/// Returns `false` when nothing existed at `path`.
pub async fn remove_path(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e).fs_context("inspecting path", path),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path).await.fs_context("removing directory", path)?;
    } else {
        fs::remove_file(path).await.fs_context("removing file", path)?;
    }
    Ok(true)
}

/// Adds the executable bit for user, group and other.
#[cfg(unix)]
pub async fn add_exec_bit(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).await.fs_context("reading permissions", path)?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)
        .await
        .fs_context("setting permissions", path)
}

/// Executable bits do not exist here; only checks the file is present.
#[cfg(not(unix))]
pub async fn add_exec_bit(path: &Path) -> Result<()> {
    fs::metadata(path).await.fs_context("reading permissions", path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_dir_merges_into_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("exe.linux-x86_64");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::write(src.join("launch-linux.sh"), "#!/bin/sh\n").unwrap();
        std::fs::write(src.join("lib/libopenshot.so"), "elf").unwrap();

        let dst = dir.path().join("AppDir/usr/bin");
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("existing"), "keep").unwrap();

        copy_dir(&src, &dst).await.unwrap();

        assert!(dst.join("launch-linux.sh").is_file());
        assert!(dst.join("lib/libopenshot.so").is_file());
        assert!(dst.join("existing").is_file());
    }

    #[tokio::test]
    async fn copy_file_requires_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_file(&dir.path().join("missing.png"), &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }

    #[tokio::test]
    async fn remove_path_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("mediaservice");
        std::fs::create_dir_all(tree.join("nested")).unwrap();
        let file = dir.path().join("resvg.dll");
        std::fs::write(&file, "dll").unwrap();

        assert!(remove_path(&tree).await.unwrap());
        assert!(remove_path(&file).await.unwrap());
        assert!(!remove_path(&file).await.unwrap());
        assert!(!tree.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_bit_is_added() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AppRun");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        add_exec_bit(&path).await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
