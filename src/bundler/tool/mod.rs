//! External tool execution.
//!
//! Tools run one at a time. Stdout and stderr are read concurrently as they
//! stream, each line goes to the run log in arrival order, and the caller
//! blocks until the process exits. There is no timeout.

mod detect;
mod outcome;

pub use detect::{resolve_program, short_name};
pub use outcome::{LineRule, OutcomeInterpreter, ToolOutcome};

use crate::error::{Error, Result};
use crate::session::Session;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Everything a tool printed, plus its exit code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Output lines (stdout and stderr interleaved), without line endings.
    pub lines: Vec<String>,
}

impl ToolOutput {
    /// True when the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Lines containing something other than whitespace.
    pub fn printed_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|line| !line.trim().is_empty())
    }

    /// Last line containing something other than whitespace.
    pub fn last_line(&self) -> Option<&str> {
        self.printed_lines().last().map(str::trim)
    }
}

/// A command line for an external tool.
///
/// Arguments are passed directly, never through a shell, and are not
/// written to any log (they may carry signing passwords).
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Starts a command for `program` (a path or a name looked up on `PATH`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program file name, used in log lines.
    pub fn display_name(&self) -> &str {
        short_name(&self.program)
    }

    /// Runs the tool to completion, streaming its output into the run log.
    pub async fn run(&self, session: &mut Session) -> Result<ToolOutput> {
        let cwd = self
            .current_dir
            .as_deref()
            .map_or_else(|| "None".to_string(), |dir| dir.display().to_string());
        session.output(format!("Running {}... ({})", self.display_name(), cwd));

        let program = resolve_program(&self.program);
        let mut command = Command::new(&program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| Error::ToolLaunch {
            program: self.program.clone(),
            source,
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            session.output(&line);
            lines.push(line);
        }

        let status = child.wait().await.map_err(|source| Error::ToolLaunch {
            program: self.program.clone(),
            source,
        })?;
        log::debug!("{} exited with {}", self.display_name(), status);

        Ok(ToolOutput {
            exit_code: status.code(),
            lines,
        })
    }
}

/// Sends each line of `reader` to `tx`, decoding lossily.
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("Failed to read tool output: {}", e);
                break;
            }
        }
    }
}
