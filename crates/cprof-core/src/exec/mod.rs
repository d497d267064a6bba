//! External command execution
//!
//! Every mutation of Claude Code state that is not a plain file write goes
//! through the `claude` CLI. The engine only sees the [`Executor`] trait so
//! tests can substitute a recording double for real subprocesses.

pub mod claude;
mod outcome;

pub use claude::ClaudeCli;
pub use outcome::{classify_outcome, Outcome};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Result type for executor operations
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors from running an external command
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("{program} exited with {}: {}", describe_status(.status), .output.trim())]
    Failed {
        program: String,
        status: Option<i32>,
        output: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| format!("status {code}"))
}

impl ExecError {
    /// Captured output, empty when the command never ran
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Spawn { .. } => "",
            Self::Failed { output, .. } => output,
        }
    }
}

/// A single command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; project and local scope commands run in the project
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: Option<&Path>) -> Self {
        self.cwd = dir.map(Path::to_path_buf);
        self
    }

    /// Arguments joined by spaces, without the program
    #[must_use]
    pub fn args_line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands on behalf of the engine
pub trait Executor: Send + Sync {
    /// Run with the caller's stdio attached
    fn run(&self, invocation: &Invocation) -> ExecResult<()>;

    /// Run and capture combined stdout and stderr
    ///
    /// On failure the captured text is carried in [`ExecError::Failed`].
    fn run_with_output(&self, invocation: &Invocation) -> ExecResult<String>;
}

/// Spawns real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Executor for ProcessExecutor {
    fn run(&self, invocation: &Invocation) -> ExecResult<()> {
        tracing::debug!("Running {invocation}");
        let status = Self::command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                program: invocation.program.clone(),
                status: status.code(),
                output: String::new(),
            })
        }
    }

    fn run_with_output(&self, invocation: &Invocation) -> ExecResult<String> {
        tracing::debug!("Running {invocation} (captured)");
        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExecError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ExecError::Failed {
                program: invocation.program.clone(),
                status: output.status.code(),
                output: combined,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("claude", ["plugin", "install", "a@mp"]);
        assert_eq!(inv.to_string(), "claude plugin install a@mp");
        assert_eq!(inv.args_line(), "plugin install a@mp");
        assert!(inv.cwd.is_none());
    }

    #[test]
    fn test_failed_error_message() {
        let err = ExecError::Failed {
            program: "claude".into(),
            status: Some(1),
            output: "boom\n".into(),
        };
        assert_eq!(err.to_string(), "claude exited with status 1: boom");
        assert_eq!(err.output(), "boom\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_process_executor_captures_both_streams() {
        let inv = Invocation::new("sh", ["-c", "echo out; echo err >&2; exit 3"]);
        let err = ProcessExecutor.run_with_output(&inv).unwrap_err();
        match err {
            ExecError::Failed { status, output, .. } => {
                assert_eq!(status, Some(3));
                assert!(output.contains("out"));
                assert!(output.contains("err"));
            }
            ExecError::Spawn { .. } => panic!("expected Failed"),
        }
    }

    #[test]
    fn test_process_executor_missing_program() {
        let inv = Invocation::new("cprof-definitely-not-a-program", Vec::<String>::new());
        assert!(matches!(
            ProcessExecutor.run_with_output(&inv),
            Err(ExecError::Spawn { .. })
        ));
    }
}
