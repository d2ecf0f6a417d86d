//! Process execution
//!
//! The [`Executor`] trait is the seam between check evaluation and the
//! operating system. [`ProcessExecutor`] spawns real processes; tests plug in
//! executors that replay canned output.

use cmdprobe_ast::CommandCheck;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::RunError;

/// Program and arguments to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

impl From<&CommandCheck> for Invocation {
    fn from(check: &CommandCheck) -> Self {
        Self {
            program: check.program.clone(),
            args: check.args.clone(),
        }
    }
}

/// Everything a finished process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

pub trait Executor {
    /// Run the invocation to completion and capture its output
    ///
    /// # Errors
    ///
    /// Returns `RunError` if the process could not be started at all.
    fn execute(&self, invocation: &Invocation) -> Result<CapturedOutput, RunError>;
}

/// Spawns the invocation as a child process with stdin closed
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    working_dir: Option<PathBuf>,
}

impl ProcessExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self { working_dir: None }
    }

    /// Run commands from `dir` instead of the current directory
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<CapturedOutput, RunError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(program = %invocation.program, args = ?invocation.args, "spawning");
        let output = command
            .output()
            .map_err(|source| spawn_error(&invocation.program, source))?;

        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(
            program = %invocation.program,
            exit_code = ?captured.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "process finished"
        );
        Ok(captured)
    }
}

fn spawn_error(program: &str, source: io::Error) -> RunError {
    let program = program.to_string();
    match source.kind() {
        io::ErrorKind::NotFound => RunError::NotFound { program },
        io::ErrorKind::PermissionDenied => RunError::NotExecutable { program },
        _ => RunError::Spawn { program, source },
    }
}
