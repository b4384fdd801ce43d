//! Command line interface for the build server.

mod args;

pub use args::Args;

use crate::bundler::Platform;
use crate::error::{ErrorExt, Result};
use crate::metadata::EnvFileMetadata;
use crate::notify::{Notifier, ZulipNotifier};
use crate::pipeline::{self, Pipeline, RunOptions};
use crate::publish::GitHubReleases;
use crate::session::Session;
use crate::settings::{ChatSettings, Settings};
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the project root.
pub const ROOT_ENV: &str = "BUILD_SERVER_ROOT";

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    run_with_args(std::env::args_os()).await
}

/// Runs the build server with an explicit argument list and returns the
/// process exit code.
///
/// Arguments are validated before the run log is created, so a bad
/// command line leaves no trace on disk. Everything after that is logged:
/// a failure to detect the platform or load settings still ends in a
/// failed-build log and notification.
pub async fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = Args::try_parse_args(args)?;
    args.validate()?;

    let root = project_root()?;
    let mut session = Session::create(&Settings::log_path_in(&root))?;

    let platform = match Platform::detect() {
        Ok(platform) => platform,
        Err(e) => return Ok(pipeline::abort(None, &args.branch, &e, None, &mut session).await),
    };
    let settings = match Settings::load(&root) {
        Ok(settings) => settings,
        Err(e) => {
            let notifier = args
                .chat_token()
                .and_then(|token| fallback_notifier(&ChatSettings::default(), token));
            let notifier = notifier.as_ref().map(|n| n as &dyn Notifier);
            let code = pipeline::abort(Some(platform), &args.branch, &e, notifier, &mut session).await;
            return Ok(code);
        }
    };

    let metadata = EnvFileMetadata::new(
        settings.build_dir(),
        settings.product().artifact_prefix.clone(),
    );
    let release_host = args
        .hosting_credentials()
        .map(|(user, password)| GitHubReleases::new(settings.release(), user, password))
        .transpose()?;
    let notifier = args
        .chat_token()
        .map(|token| ZulipNotifier::new(settings.chat(), token))
        .transpose()?;

    let mut pipeline = Pipeline::new(&settings, &metadata);
    if let Some(host) = &release_host {
        pipeline = pipeline.with_release_host(host);
    }
    if let Some(notifier) = &notifier {
        pipeline = pipeline.with_notifier(notifier);
    }

    let options = RunOptions {
        platform,
        arch: args.arch(),
        branch: args.branch.clone(),
        signing: args.signing_key(),
    };
    let report = pipeline.run(&options, &mut session).await;
    Ok(report.exit_code)
}

/// Notifier built from default chat settings when the configured ones
/// could not be loaded.
fn fallback_notifier(chat: &ChatSettings, token: &str) -> Option<ZulipNotifier> {
    ZulipNotifier::new(chat, token)
        .map_err(|e| log::warn!("Cannot reach chat service: {}", e))
        .ok()
}

/// `BUILD_SERVER_ROOT`, or the current directory.
fn project_root() -> Result<PathBuf> {
    match std::env::var_os(ROOT_ENV) {
        Some(root) if !root.is_empty() => Ok(PathBuf::from(root)),
        _ => std::env::current_dir().fs_context("reading current directory", &PathBuf::from(".")),
    }
}
