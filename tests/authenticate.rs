//! The authenticate check
//!
//! Evaluates `checks/authenticate.rb` against canned output to pin down its
//! matching behavior, and against the real binary when it is installed.
//! Run the live check with: cargo test --test authenticate -- --ignored

use cmdprobe_ast::{CheckFile, CommandCheck};
use cmdprobe_parser::Parser;
use cmdprobe_runner::{
    CapturedOutput, CheckReport, CheckStatus, Executor, Invocation, RunError, Runner,
};

const AUTHENTICATE_CHECK: &str = include_str!("../checks/authenticate.rb");

const VALID_LINE: &str = "Authenticate with a valid password <nil>";
const INVALID_LINE: &str =
    "Authenticate with an invalid password POST https://testhost/authenticate_user: 401";

struct Canned(CapturedOutput);

impl Executor for Canned {
    fn execute(&self, _invocation: &Invocation) -> Result<CapturedOutput, RunError> {
        Ok(self.0.clone())
    }
}

struct Missing;

impl Executor for Missing {
    fn execute(&self, invocation: &Invocation) -> Result<CapturedOutput, RunError> {
        Err(RunError::NotFound {
            program: invocation.program.clone(),
        })
    }
}

fn check_file() -> CheckFile {
    Parser::new_with_filename(AUTHENTICATE_CHECK, "checks/authenticate.rb")
        .unwrap()
        .parse()
        .unwrap()
}

fn authenticate_check() -> CommandCheck {
    let mut file = check_file();
    assert_eq!(file.checks.len(), 1);
    file.checks.remove(0).node
}

fn run(stdout: &str, stderr: &str, exit_code: Option<i32>) -> CheckReport {
    let runner = Runner::with_executor(Canned(CapturedOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code,
    }));
    runner.run_check(&authenticate_check())
}

fn healthy_stdout() -> String {
    format!("{VALID_LINE}\n{INVALID_LINE}\n")
}

/// Outcome of the assertion at `index` in file order:
/// 0 = stderr clean, 1 = valid password line, 2 = invalid password line
fn passed(report: &CheckReport, index: usize) -> bool {
    report.outcomes[index].passed
}

#[test]
fn test_check_targets_the_authenticate_binary() {
    let check = authenticate_check();

    assert_eq!(check.program, "/go/src/testapi/bin/authenticate");
    assert!(check.args.is_empty());
    assert_eq!(check.assertions.len(), 3);
}

#[test]
fn test_expected_output_passes() {
    let report = run(&healthy_stdout(), "", Some(0));

    assert_eq!(report.status, CheckStatus::Passed);
    assert!(report.outcomes.iter().all(|outcome| outcome.passed));
}

#[test]
fn test_valid_password_line_with_trailing_lines() {
    let report = run(&format!("{VALID_LINE}\nsome other line"), "", Some(0));

    assert!(passed(&report, 1));
    assert!(!passed(&report, 2));
}

#[test]
fn test_valid_password_line_requires_literal_nil() {
    let report = run(
        &format!("Authenticate with a valid password <Nil>\n{INVALID_LINE}\n"),
        "",
        Some(0),
    );
    assert!(!passed(&report, 1));
    assert_eq!(report.status, CheckStatus::Failed);

    let report = run(
        &format!("Authenticate with a valid password\n{INVALID_LINE}\n"),
        "",
        Some(0),
    );
    assert!(!passed(&report, 1));

    let report = run(
        &format!("Authenticate with a valid password nil\n{INVALID_LINE}\n"),
        "",
        Some(0),
    );
    assert!(!passed(&report, 1));
}

#[test]
fn test_lines_must_start_at_line_beginning() {
    let report = run(
        &format!("> {VALID_LINE}\n> {INVALID_LINE}\n"),
        "",
        Some(0),
    );

    assert!(!passed(&report, 1));
    assert!(!passed(&report, 2));
}

#[test]
fn test_empty_stderr_passes() {
    let report = run(&healthy_stdout(), "", Some(0));

    assert!(passed(&report, 0));
}

#[test]
fn test_stderr_with_error_fails() {
    let report = run(&healthy_stdout(), "2024: an error occurred", Some(0));

    assert!(!passed(&report, 0));
    assert_eq!(report.status, CheckStatus::Failed);
    assert_eq!(report.outcomes[0].actual, "2024: an error occurred");
}

#[test]
fn test_stderr_forbidden_phrases_any_case() {
    for stderr in [
        "ERROR: boom",
        "open config.json: no such file or directory",
        "Cannot find package",
        "imported and not used: \"fmt\"",
        "Undefined: chef.Client",
    ] {
        let report = run(&healthy_stdout(), stderr, Some(0));
        assert!(!passed(&report, 0), "stderr {stderr:?} should fail the check");
    }

    let report = run(&healthy_stdout(), "warning: deprecated flag", Some(0));
    assert!(passed(&report, 0));
}

#[test]
fn test_invalid_password_line_requires_401() {
    let report = run(
        &format!("{VALID_LINE}\n{}\n", INVALID_LINE.replace("401", "403")),
        "",
        Some(0),
    );

    assert!(passed(&report, 1));
    assert!(!passed(&report, 2));
}

#[test]
fn test_exit_status_is_not_checked() {
    let report = run(&healthy_stdout(), "", Some(1));
    assert_eq!(report.status, CheckStatus::Passed);
    assert_eq!(report.exit_code, Some(1));

    let report = run(&healthy_stdout(), "", None);
    assert_eq!(report.status, CheckStatus::Passed);
}

#[test]
fn test_missing_binary_is_an_infrastructure_error() {
    let runner = Runner::with_executor(Missing);
    let report = runner.run_check(&authenticate_check());

    assert_eq!(report.status, CheckStatus::Error);
    assert!(report.outcomes.is_empty());
    assert!(
        report
            .error
            .unwrap()
            .contains("/go/src/testapi/bin/authenticate")
    );
}

#[test]
#[ignore = "requires /go/src/testapi/bin/authenticate and a reachable testhost"]
fn test_live_authenticate_binary() {
    let report = Runner::new().run_file("checks/authenticate.rb", &check_file());

    for check in &report.checks {
        if let Some(error) = &check.error {
            panic!("{}: {error}", check.command);
        }
        for failure in check.failures() {
            panic!(
                "{} failed; captured {}:\n{}",
                failure.description, failure.stream, failure.actual
            );
        }
    }
    assert!(report.is_success());
}
