//! Version stamping and Inno Setup compilation.
//!
//! Both tools print nothing when they succeed, so any output is treated
//! as a failure.

use crate::bundler::tool::{OutcomeInterpreter, ToolCommand, ToolOutcome};
use crate::bundler::utils::fs;
use crate::error::{Error, ErrorExt, Result};
use crate::session::Session;
use crate::settings::{Arch, ProductSettings, ToolSettings};
use std::path::{Path, PathBuf};

const SILENT: OutcomeInterpreter = OutcomeInterpreter::Silent { benign: &[] };

/// File the Inno script writes into `<script dir>/Output/`.
pub const COMPILED_INSTALLER: &str = "OpenShot.exe";

/// Writes version resources into the frozen launcher with `verpatch`.
///
/// A `verpatch` that cannot be started is reported as a failed outcome, like
/// any other output, so packaging goes on.
pub async fn stamp_version(
    tools: &ToolSettings,
    product: &ProductSettings,
    launcher: &Path,
    version: &str,
    session: &mut Session,
) -> Result<ToolOutcome> {
    let run = ToolCommand::new(tools.verpatch.as_str())
        .path_arg(launcher)
        .arg("/va")
        .args(["/high", version])
        .args(["/pv", version])
        .args(["/s", "product", product.product_name.as_str()])
        .args(["/s", "company", product.company_name.as_str()])
        .args(["/s", "copyright", product.copyright.as_str()])
        .args(["/s", "desc", product.product_name.as_str()])
        .run(session)
        .await;
    match run {
        Ok(output) => Ok(SILENT.interpret(&output)),
        Err(e @ Error::ToolLaunch { .. }) => Ok(ToolOutcome::Failed(vec![e.to_string()])),
        Err(e) => Err(e),
    }
}

/// Copies the installer support files (uninstall helpers, images) into the
/// build directory.
pub async fn copy_support_files(support_dir: &Path, build_dir: &Path) -> Result<usize> {
    let mut copied = 0;
    let mut entries = tokio::fs::read_dir(support_dir)
        .await
        .fs_context("listing installer support files", support_dir)?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("listing installer support files", support_dir)?
    {
        let path = entry.path();
        if path.is_file() {
            fs::copy_file(&path, &build_dir.join(entry.file_name())).await?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Where a successful compile leaves the installer.
pub fn compiled_installer_path(inno_script: &Path) -> PathBuf {
    inno_script
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("Output")
        .join(COMPILED_INSTALLER)
}

/// Compiles the installer with `iscc`.
///
/// Success additionally requires the compiled installer to exist; a
/// missing file is reported as [`ToolOutcome::MissingSentinel`].
pub async fn compile_installer(
    tools: &ToolSettings,
    inno_script: &Path,
    project_root: &Path,
    version: &str,
    arch: Arch,
    session: &mut Session,
) -> Result<ToolOutcome> {
    let output = ToolCommand::new(tools.iscc.as_str())
        .arg("/Q")
        .arg(format!("/DVERSION={version}"))
        .arg(format!("/DONLY_64_BIT={}", arch.only_64_bit_marker()))
        .arg(format!("/DPY_EXE_DIR={}", tools.windows_frozen_dir_name()))
        .path_arg(inno_script)
        .current_dir(project_root)
        .run(session)
        .await?;

    let outcome = SILENT.interpret(&output);
    if outcome.is_success() && !compiled_installer_path(inno_script).is_file() {
        return Ok(ToolOutcome::MissingSentinel {
            last_line: output.last_line().map(str::to_string),
        });
    }
    Ok(outcome)
}

/// Moves the compiled installer to `artifact_path` and removes the empty
/// `Output` directory left behind by the compiler.
pub async fn collect_installer(inno_script: &Path, artifact_path: &Path) -> Result<()> {
    let compiled = compiled_installer_path(inno_script);
    tokio::fs::rename(&compiled, artifact_path)
        .await
        .fs_context("moving compiled installer", &compiled)?;

    if let Some(output_dir) = compiled.parent() {
        if let Err(e) = tokio::fs::remove_dir(output_dir).await {
            log::warn!(
                "Failed to remove installer output directory {}: {}",
                output_dir.display(),
                e
            );
        }
    }
    Ok(())
}
