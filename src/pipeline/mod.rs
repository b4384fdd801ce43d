//! Run orchestration.
//!
//! A run moves through fixed stages:
//!
//! ```text
//! Init -> VersionResolved -> Packaged -> Published | SkippedPublish -> Notified -> Done
//! ```
//!
//! Publication happens only while the error ledger is empty. An `Err` from
//! any stage is recorded as an unhandled exception and the run still goes on
//! to notification. The exit code is 1 whenever the ledger is non-empty.

use crate::bundler::{Artifact, Packager, Platform, SigningKey};
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::metadata::{MetadataSource, extract_version};
use crate::notify::{self, Notifier};
use crate::publish::{Publisher, ReleaseHost, RetryPolicy};
use crate::session::Session;
use crate::settings::{Arch, Settings};

/// Printed at the end of a clean run.
pub const SUCCESS_LINE: &str = "Successfully completed build-server script!";

/// Printed at the end of a failed run.
pub const FAILURE_LINE: &str = "build-server script failed!";

/// Progress marker of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Arguments accepted, log opened.
    Init,
    /// Build name and version number known.
    VersionResolved,
    /// Packager finished (with or without an artifact).
    Packaged,
    /// Installer and torrent uploaded.
    Published,
    /// Nothing uploaded: failures recorded, unpublished branch or no host.
    SkippedPublish,
    /// Chat notification sent.
    Notified,
    /// Run finished.
    Done,
}

/// Per-run choices taken from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Host platform.
    pub platform: Platform,
    /// Installer architecture.
    pub arch: Arch,
    /// Branch being built.
    pub branch: String,
    /// Windows signing credentials.
    pub signing: Option<SigningKey>,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Stages reached, in order.
    pub stages: Vec<Stage>,
    /// Name of the installer, once the build name was resolved.
    pub artifact_name: Option<String>,
    /// Packaged installer, if one was produced.
    pub artifact: Option<Artifact>,
    /// Public URL of the uploaded installer.
    pub download_url: Option<String>,
    /// Process exit code.
    pub exit_code: i32,
}

impl RunReport {
    /// True if `stage` was reached.
    pub fn reached(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Sequences packaging, publication and notification.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    metadata: &'a dyn MetadataSource,
    release_host: Option<&'a dyn ReleaseHost>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline that neither publishes nor notifies.
    pub fn new(settings: &'a Settings, metadata: &'a dyn MetadataSource) -> Self {
        Self {
            settings,
            metadata,
            release_host: None,
            notifier: None,
        }
    }

    /// Enables publication to `host`.
    pub fn with_release_host(mut self, host: &'a dyn ReleaseHost) -> Self {
        self.release_host = Some(host);
        self
    }

    /// Enables chat notification through `notifier`.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Runs every stage and reports the outcome.
    pub async fn run(&self, options: &RunOptions, session: &mut Session) -> RunReport {
        let mut report = RunReport::default();

        write_header(options.platform.name(), &options.branch, session);
        report.stages.push(Stage::Init);

        if let Err(e) = self.package_and_publish(options, session, &mut report).await {
            session.record(format!("Unhandled exception: {e}"));
        }

        let summary = Summary {
            platform: options.platform,
            branch: &options.branch,
            artifact_name: report.artifact_name.as_deref(),
            download_url: report.download_url.as_deref(),
        };
        if conclude(&summary, self.notifier, session).await {
            report.stages.push(Stage::Notified);
        }

        report.exit_code = exit_code(session);
        report.stages.push(Stage::Done);
        report
    }

    async fn package_and_publish(
        &self,
        options: &RunOptions,
        session: &mut Session,
        report: &mut RunReport,
    ) -> Result<()> {
        let version_info = self.metadata.version_info()?;
        session.output(format!("{version_info:?}"));

        let build_name = self.metadata.build_name(&version_info, &options.branch)?;
        session.output(format!("git description of openshot-qt-git: {build_name}"));
        let version = extract_version(&build_name)?;

        let ctx = BuildContext::new(
            options.platform,
            options.arch,
            options.branch.clone(),
            version_info,
            build_name,
            version,
        );
        report.artifact_name = Some(ctx.artifact_name());
        report.stages.push(Stage::VersionResolved);

        let packager = Packager::for_platform(options.platform, self.settings, options.signing.clone());
        let artifact = packager.package(&ctx, session).await?;
        report.stages.push(Stage::Packaged);

        let Some(artifact) = artifact else {
            report.stages.push(Stage::SkippedPublish);
            return Ok(());
        };
        artifact.log_summary(session);
        report.artifact = Some(artifact.clone());

        if !session.ledger().is_empty() {
            session.output("Skipping upload: errors were detected");
            report.stages.push(Stage::SkippedPublish);
            return Ok(());
        }
        if !ctx.is_published_branch() {
            session.output(format!(
                "Skipping upload: branch {} is not published",
                ctx.branch()
            ));
            report.stages.push(Stage::SkippedPublish);
            return Ok(());
        }
        let Some(host) = self.release_host else {
            log::warn!("No hosting credentials given; skipping upload");
            session.output("Skipping upload: no hosting credentials");
            report.stages.push(Stage::SkippedPublish);
            return Ok(());
        };

        let release_settings = self.settings.release();
        let publisher = Publisher::new(host, RetryPolicy::immediate(release_settings.upload_attempts));
        let mut release = publisher.release(&release_settings.tag).await?;
        let download_url = publisher
            .publish(self.settings, &artifact, ctx.version(), &mut release, session)
            .await?;
        report.download_url = Some(download_url);
        report.stages.push(Stage::Published);
        Ok(())
    }
}

/// Records an error that stopped the run before a [`Pipeline`] existed.
///
/// The failure is written to the run log under the usual header and, when
/// both the platform and a notifier are known, announced like any other
/// failed build. Returns the process exit code.
pub async fn abort(
    platform: Option<Platform>,
    branch: &str,
    error: &Error,
    notifier: Option<&dyn Notifier>,
    session: &mut Session,
) -> i32 {
    write_header(
        platform.map_or(std::env::consts::OS, Platform::name),
        branch,
        session,
    );
    session.record(format!("Unhandled exception: {error}"));

    match platform {
        Some(platform) => {
            let summary = Summary {
                platform,
                branch,
                artifact_name: None,
                download_url: None,
            };
            conclude(&summary, notifier, session).await;
        }
        None => {
            session.output(FAILURE_LINE);
            flush(session);
        }
    }
    exit_code(session)
}

/// What the closing notification reports on.
struct Summary<'a> {
    platform: Platform,
    branch: &'a str,
    artifact_name: Option<&'a str>,
    download_url: Option<&'a str>,
}

fn write_header(system: &str, branch: &str, session: &mut Session) {
    session.output(format!(
        "{} Build Log for {} (branch: {})",
        system,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        branch
    ));
}

/// Writes the closing line and notifies. Returns true if a notifier ran.
async fn conclude(
    summary: &Summary<'_>,
    notifier: Option<&dyn Notifier>,
    session: &mut Session,
) -> bool {
    let system = summary.platform.name();
    let (title, comment) = match session.ledger().first() {
        None => {
            session.output(SUCCESS_LINE);
            (
                format!(
                    "{}: Build logs for {}",
                    system,
                    summary.artifact_name.unwrap_or("unknown build")
                ),
                notify::success_comment(summary.branch, summary.download_url),
            )
        }
        Some(first) => {
            let comment = notify::failure_comment(first);
            session.output(FAILURE_LINE);
            (
                format!("{}: Error log for *{}* build", system, summary.branch),
                comment,
            )
        }
    };

    let notified = match notifier {
        Some(notifier) => {
            notify::notify(notifier, summary.platform, &title, &comment, session).await;
            true
        }
        None => {
            log::warn!("No chat token given; skipping build notification");
            false
        }
    };
    flush(session);
    notified
}

fn exit_code(session: &Session) -> i32 {
    if session.ledger().is_empty() { 0 } else { 1 }
}

fn flush(session: &mut Session) {
    if let Err(e) = session.flush_log() {
        log::warn!("Failed to flush run log: {}", e);
    }
}
