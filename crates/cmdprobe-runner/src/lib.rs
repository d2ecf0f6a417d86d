//! cmdprobe runner
//!
//! Executes described commands synchronously, captures their output streams
//! and evaluates every assertion against them. A command that cannot be
//! started is reported as an infrastructure error, never as a failed
//! assertion, and the process exit status only matters when a check asserts
//! on `exit_status`.

use cmdprobe_ast::{CheckFile, CommandCheck};
use std::io;
use tracing::{info, warn};

pub mod evaluate;
pub mod executor;
pub mod report;

pub use executor::{CapturedOutput, Executor, Invocation, ProcessExecutor};
pub use report::{AssertionOutcome, CheckReport, CheckStatus, Report, Summary};

/// Infrastructure errors: the check could not be carried out at all
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("ERR_NOT_FOUND: {program}: no such file or directory")]
    NotFound { program: String },

    #[error("ERR_NOT_EXECUTABLE: {program}: permission denied")]
    NotExecutable { program: String },

    #[error("ERR_SPAWN: {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

pub struct Runner<E = ProcessExecutor> {
    executor: E,
}

impl Runner<ProcessExecutor> {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_executor(ProcessExecutor::new())
    }
}

impl Default for Runner<ProcessExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Executor> Runner<E> {
    #[must_use]
    pub const fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Run one command and evaluate all of its assertions
    ///
    /// Assertions are not short-circuited: the report lists every failure.
    pub fn run_check(&self, check: &CommandCheck) -> CheckReport {
        let output = match self.executor.execute(&Invocation::from(check)) {
            Ok(output) => output,
            Err(err) => {
                warn!(command = %check.command, error = %err, "command could not be run");
                return CheckReport::from_error(check, &err, None);
            }
        };

        let outcomes = check
            .assertions
            .iter()
            .map(|assertion| {
                let passed = evaluate::holds(&assertion.node, &output);
                AssertionOutcome::new(&assertion.node, assertion.span, passed, &output)
            })
            .collect();

        let report = CheckReport::from_outcomes(check, &output, outcomes);
        info!(
            command = %check.command,
            status = report.status.label(),
            failures = report.failures().count(),
            "check finished"
        );
        report
    }

    /// Run every check of a file in order
    pub fn run_file(&self, source: &str, file: &CheckFile) -> Report {
        Report {
            source: source.to_string(),
            checks: file
                .checks
                .iter()
                .map(|check| self.run_check(&check.node))
                .collect(),
        }
    }
}
