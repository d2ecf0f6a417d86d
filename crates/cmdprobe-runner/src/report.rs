//! Check results
//!
//! Assertion failures are values here, not errors: a report always describes
//! what ran, what was expected and what was captured.

use cmdprobe_ast::{Assertion, CommandCheck, Polarity, Span, Stream};
use serde::Serialize;
use std::ops::AddAssign;

use crate::evaluate::subject;
use crate::{CapturedOutput, RunError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Every assertion held
    Passed,
    /// The command ran but at least one assertion did not hold
    Failed,
    /// The command could not be run or evaluated at all
    Error,
}

impl CheckStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssertionOutcome {
    /// The assertion as written back in check-file syntax
    pub description: String,
    pub stream: Stream,
    pub polarity: Polarity,
    /// Matcher with its operand, e.g. `match /^ok/`
    pub expected: String,
    pub passed: bool,
    /// Captured content of `stream`
    pub actual: String,
    pub span: Span,
}

impl AssertionOutcome {
    #[must_use]
    pub fn new(assertion: &Assertion, span: Span, passed: bool, output: &CapturedOutput) -> Self {
        Self {
            description: assertion.to_string(),
            stream: assertion.stream,
            polarity: assertion.polarity,
            expected: assertion.matcher.to_string(),
            passed,
            actual: subject(assertion.stream, output).into_owned(),
            span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub command: String,
    pub status: CheckStatus,
    /// Infrastructure error message when `status` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    pub outcomes: Vec<AssertionOutcome>,
}

impl CheckReport {
    #[must_use]
    pub fn from_outcomes(
        check: &CommandCheck,
        output: &CapturedOutput,
        outcomes: Vec<AssertionOutcome>,
    ) -> Self {
        let status = if outcomes.iter().all(|outcome| outcome.passed) {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        Self {
            command: check.command.clone(),
            status,
            error: None,
            exit_code: output.exit_code,
            outcomes,
        }
    }

    #[must_use]
    pub fn from_error(check: &CommandCheck, error: &RunError, exit_code: Option<i32>) -> Self {
        Self {
            command: check.command.clone(),
            status: CheckStatus::Error,
            error: Some(error.to_string()),
            exit_code,
            outcomes: Vec::new(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed)
    }
}

/// Results of one check file
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// File name (or `<input>`) the checks came from
    pub source: String,
    pub checks: Vec<CheckReport>,
}

impl Report {
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for check in &self.checks {
            summary.total += 1;
            match check.status {
                CheckStatus::Passed => summary.passed += 1,
                CheckStatus::Failed => summary.failed += 1,
                CheckStatus::Error => summary.errors += 1,
            }
        }
        summary
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status == CheckStatus::Passed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errors += other.errors;
    }
}
