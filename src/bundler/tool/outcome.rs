//! Interpretation of external tool output.
//!
//! Several packaging tools report failure only through what they print.
//! Each tool gets an [`OutcomeInterpreter`] so the string matching lives in
//! one place and can be tested without spawning anything.

use super::ToolOutput;

/// Verdict for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool did what was asked.
    Success,
    /// Output lines classified as failures (or a synthesized exit-code line).
    Failed(Vec<String>),
    /// Output was clean but the completion marker never appeared.
    MissingSentinel {
        /// Last non-blank line printed, if any.
        last_line: Option<String>,
    },
}

impl ToolOutcome {
    /// True for [`ToolOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success)
    }

    /// The line to quote in an error message.
    pub fn detail(&self) -> &str {
        match self {
            ToolOutcome::Success => "",
            ToolOutcome::Failed(lines) => lines.last().map(String::as_str).unwrap_or_default(),
            ToolOutcome::MissingSentinel { last_line } => last_line.as_deref().unwrap_or_default(),
        }
    }
}

/// A line matching `token` is a failure unless it also contains `unless`.
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    /// Substring marking a failure.
    pub token: &'static str,
    /// Substring that clears the match.
    pub unless: Option<&'static str>,
}

impl LineRule {
    /// Rule without an exception.
    pub const fn token(token: &'static str) -> Self {
        Self {
            token,
            unless: None,
        }
    }

    /// Rule cleared by `unless`.
    pub const fn token_unless(token: &'static str, unless: &'static str) -> Self {
        Self {
            token,
            unless: Some(unless),
        }
    }

    fn matches(&self, line: &str) -> bool {
        line.contains(self.token) && self.unless.is_none_or(|unless| !line.contains(unless))
    }
}

/// How to decide whether a tool succeeded.
#[derive(Debug, Clone, Copy)]
pub enum OutcomeInterpreter {
    /// Exit status decides. Preferred for tools that report one.
    ExitCode,
    /// The tool prints nothing on success; any line not containing a benign
    /// substring is a failure.
    Silent {
        /// Substrings of lines that are tolerated.
        benign: &'static [&'static str],
    },
    /// Lines matching a rule are failures; success additionally requires
    /// a line containing `sentinel` when one is set.
    Scan {
        /// Failure rules.
        rules: &'static [LineRule],
        /// Completion marker.
        sentinel: Option<&'static str>,
    },
    /// The last non-blank line must end with `suffix`.
    FinalLine {
        /// Expected ending of the final line.
        suffix: &'static str,
    },
}

impl OutcomeInterpreter {
    /// Classifies a finished tool run.
    pub fn interpret(&self, output: &ToolOutput) -> ToolOutcome {
        match self {
            OutcomeInterpreter::ExitCode => {
                if output.success() {
                    ToolOutcome::Success
                } else {
                    ToolOutcome::Failed(vec![format!(
                        "exited with status {}",
                        output
                            .exit_code
                            .map_or_else(|| "unknown".to_string(), |code| code.to_string())
                    )])
                }
            }
            OutcomeInterpreter::Silent { benign } => {
                let failures: Vec<String> = output
                    .printed_lines()
                    .filter(|line| !benign.iter().any(|b| line.contains(b)))
                    .map(str::to_string)
                    .collect();
                if failures.is_empty() {
                    ToolOutcome::Success
                } else {
                    ToolOutcome::Failed(failures)
                }
            }
            OutcomeInterpreter::Scan { rules, sentinel } => {
                let failures: Vec<String> = output
                    .printed_lines()
                    .filter(|line| rules.iter().any(|rule| rule.matches(line)))
                    .map(str::to_string)
                    .collect();
                if !failures.is_empty() {
                    return ToolOutcome::Failed(failures);
                }
                match sentinel {
                    Some(sentinel) if !output.lines.iter().any(|l| l.contains(sentinel)) => {
                        ToolOutcome::MissingSentinel {
                            last_line: output.last_line().map(str::to_string),
                        }
                    }
                    _ => ToolOutcome::Success,
                }
            }
            OutcomeInterpreter::FinalLine { suffix } => match output.last_line() {
                Some(line) if line.ends_with(suffix) => ToolOutcome::Success,
                last => ToolOutcome::MissingSentinel {
                    last_line: last.map(str::to_string),
                },
            },
        }
    }
}
