//! Cleanup of the frozen Windows tree before it is packaged.
//!
//! The freezer copies duplicate modules, unneeded Qt plugins and debug
//! builds of the Qt libraries. They are pruned here, and the plugin
//! directories are replaced with the toolchain's own copies.

use crate::bundler::utils::fs;
use crate::error::{ErrorExt, Result};
use crate::session::Session;
use std::path::{Path, PathBuf};

/// Paths (relative to the frozen root) deleted before packaging.
pub const PATHS_TO_DELETE: [&str; 6] = [
    "mediaservice",
    "imageformats",
    "platforms",
    "printsupport",
    "lib/openshot_qt",
    "resvg.dll",
];

/// Qt plugin directories replaced from the toolchain.
pub const PLUGINS_TO_REPLACE: [&str; 2] = ["imageformats", "platforms"];

/// Qt libraries copied into the frozen root when missing.
pub const QT_LIBRARIES: [&str; 2] = ["Qt5Core.dll", "Qt5Svg.dll"];

/// Subdirectories (plus the root) cleaned of debug libraries.
const DEBUG_LIBRARY_DIRS: [&str; 3] = ["", "platforms", "imageformats"];

/// Repairs the frozen tree at `exe_dir`.
///
/// `mingw_root` is the MSYS2 toolchain prefix (`<msys>/mingw64` or
/// `<msys>/mingw32`) providing the Qt plugins and libraries.
pub async fn repair_frozen_tree(
    exe_dir: &Path,
    mingw_root: &Path,
    python_abi: &str,
    session: &mut Session,
) -> Result<()> {
    // Duplicate copy of the application package
    let duplicate = exe_dir
        .join("lib")
        .join(format!("python{python_abi}"))
        .join("openshot_qt");
    if fs::remove_path(&duplicate).await? {
        session.output(format!("Removed duplicate module: {}", duplicate.display()));
    }

    for relative in PATHS_TO_DELETE {
        let path = exe_dir.join(relative);
        session.output(format!("Delete path: {}", path.display()));
        if !fs::remove_path(&path).await? {
            session.output(format!("Invalid delete path: {}", path.display()));
        }
    }

    let plugins = mingw_root.join("share").join("qt5").join("plugins");
    for name in PLUGINS_TO_REPLACE {
        fs::copy_dir(&plugins.join(name), &exe_dir.join(name)).await?;
    }

    let bin = mingw_root.join("bin");
    for name in QT_LIBRARIES {
        let source = bin.join(name);
        let dest = exe_dir.join(name);
        if source.exists() && !dest.exists() {
            session.output(format!("Copying {} to {}", source.display(), dest.display()));
            fs::copy_file(&source, &dest).await?;
        }
    }

    for sub_dir in DEBUG_LIBRARY_DIRS {
        let dir = if sub_dir.is_empty() {
            exe_dir.to_path_buf()
        } else {
            exe_dir.join(sub_dir)
        };
        for removed in remove_debug_libraries(&dir).await? {
            log::debug!("Removed debug library {}", removed.display());
        }
    }

    Ok(())
}

/// True for file names of debug Qt builds (`Qt5Cored.dll`).
///
/// Any name ending in `d.dll` matches, so `food.dll` is removed while
/// `foo.dll` is kept.
pub fn is_debug_library(file_name: &str) -> bool {
    file_name.ends_with("d.dll")
}

/// Deletes debug libraries directly inside `dir`, returning what was removed.
pub async fn remove_debug_libraries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .fs_context("listing directory", dir)?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("listing directory", dir)?
    {
        let name = entry.file_name();
        if !is_debug_library(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        tokio::fs::remove_file(&path)
            .await
            .fs_context("removing debug library", &path)?;
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}
