//! Windows installer packaging.
//!
//! # Process
//!
//! 1. Repair the frozen tree in `build/exe.mingw-<abi>` ([`repair`])
//! 2. Stamp version resources into the launcher (failure is recorded, packaging continues)
//! 3. Copy installer support files into `build/`
//! 4. Compile the Inno Setup script (failure ends packaging)
//! 5. Sign the installer when credentials were given (failure deletes it)

pub mod inno;
pub mod repair;
pub mod sign;

pub use sign::SigningKey;

use crate::bundler::artifact::{Artifact, remove_partial};
use crate::context::BuildContext;
use crate::error::Result;
use crate::session::Session;
use crate::settings::Settings;

/// Builds `<build-name>-x86_64.exe` or `<build-name>-x86.exe`.
#[derive(Debug, Clone)]
pub struct WindowsPackager {
    settings: Settings,
    signing: Option<SigningKey>,
}

impl WindowsPackager {
    /// Creates the packager. Without a key the installer is left unsigned.
    pub fn new(settings: Settings, signing: Option<SigningKey>) -> Self {
        Self { settings, signing }
    }

    /// Repairs, stamps, compiles and signs.
    pub async fn package(
        &self,
        ctx: &BuildContext,
        session: &mut Session,
    ) -> Result<Option<Artifact>> {
        let settings = &self.settings;
        let tools = settings.tools();
        let product = settings.product();
        let build_dir = settings.build_dir();
        let artifact_path = build_dir.join(ctx.artifact_name());
        let exe_dir = build_dir.join(tools.windows_frozen_dir_name());
        let mingw_root = settings
            .resolve(&tools.msys_root)
            .join(ctx.arch().mingw_prefix());

        repair::repair_frozen_tree(&exe_dir, &mingw_root, &tools.python_abi, session).await?;

        let launcher = exe_dir.join(&product.launcher_exe);
        let stamped = inno::stamp_version(tools, product, &launcher, ctx.version(), session).await?;
        if !stamped.is_success() {
            session.record(format!(
                "Verpatch Error: Had output when none was expected ({})",
                stamped.detail()
            ));
        }

        let support_dir = settings.resolve(&tools.innosetup_support_dir);
        let copied = inno::copy_support_files(&support_dir, &build_dir).await?;
        log::debug!("Copied {} installer support files", copied);

        let inno_script = settings.resolve(&tools.inno_script);
        let compiled = inno::compile_installer(
            tools,
            &inno_script,
            settings.project_root(),
            ctx.version(),
            ctx.arch(),
            session,
        )
        .await?;
        if !compiled.is_success() {
            session.record(format!(
                "Inno Compiler Error: Had output when none was expected ({})",
                compiled.detail()
            ));
            remove_partial(&artifact_path, session).await?;
            return Ok(None);
        }
        inno::collect_installer(&inno_script, &artifact_path).await?;

        match &self.signing {
            Some(key) => {
                let signed =
                    sign::sign_installer(tools, product, key, ctx.arch(), &artifact_path, session)
                        .await?;
                if !signed.is_success() {
                    session.record(format!(
                        "Key Sign Error: Had output when none was expected ({})",
                        signed.detail()
                    ));
                    remove_partial(&artifact_path, session).await?;
                    return Ok(None);
                }
            }
            None => {
                log::warn!("No signing credentials given; installer left unsigned");
                session.output("Skipping code signing (no signing key)");
            }
        }

        let artifact = Artifact::from_file(&artifact_path).await?;
        Ok(Some(artifact))
    }
}
