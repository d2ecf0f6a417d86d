//! Integration tests for parser + runner pipeline
//! Runs parsed checks against real child processes

use cmdprobe_parser::Parser;
use cmdprobe_runner::{CheckStatus, ProcessExecutor, Report, Runner};
use std::fs;
use tempfile::TempDir;

fn run_source(source: &str) -> Report {
    let file = Parser::new(source).unwrap().parse().unwrap();
    Runner::new().run_file("<input>", &file)
}

#[test]
fn test_stdout_and_stderr_are_checked_independently() {
    let report = run_source(
        r#"describe command('sh -c "echo ready; echo careful >&2"') do
  its('stdout') { should match(/^ready$/) }
  its('stderr') { should match(/^careful/) }
  its('stdout') { should_not include 'careful' }
end"#,
    );

    assert_eq!(report.checks[0].status, CheckStatus::Passed);
}

#[test]
fn test_failed_assertions_keep_captured_text() {
    let report = run_source(
        r#"describe command('sh -c "echo something undefined >&2"') do
  its('stderr') { should_not match(/undefined/i) }
end"#,
    );

    let check = &report.checks[0];
    assert_eq!(check.status, CheckStatus::Failed);
    assert_eq!(check.outcomes[0].actual, "something undefined\n");
}

#[test]
fn test_exit_code_captured_but_not_asserted() {
    let report = run_source(
        r#"describe command('sh -c "echo partial; exit 7"') do
  its('stdout') { should match(/partial/) }
end"#,
    );

    assert_eq!(report.checks[0].status, CheckStatus::Passed);
    assert_eq!(report.checks[0].exit_code, Some(7));
}

#[test]
fn test_missing_executable_is_an_error() {
    let report = run_source(
        "describe command('/nonexistent/testapi/bin/authenticate') do
  its('stdout') { should match(/^Authenticate/) }
end",
    );

    let check = &report.checks[0];
    assert_eq!(check.status, CheckStatus::Error);
    assert!(check.error.as_deref().unwrap().contains("ERR_NOT_FOUND"));
    assert!(!report.is_success());
}

#[cfg(unix)]
#[test]
fn test_non_executable_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("authenticate");
    fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();

    let source = format!(
        "describe command('{}') do\n  its('stdout') {{ should eq \"hi\\n\" }}\nend\n",
        script.display()
    );
    let report = run_source(&source);

    let check = &report.checks[0];
    assert_eq!(check.status, CheckStatus::Error);
    assert!(check.error.as_deref().unwrap().contains("ERR_NOT_EXECUTABLE"));
}

#[cfg(unix)]
#[test]
fn test_fake_authenticate_binary() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let script = dir.path().join("authenticate");
    fs::write(
        &script,
        "#!/bin/sh\n\
         echo 'Authenticate with a valid password <nil>'\n\
         echo 'Authenticate with an invalid password POST https://testhost/authenticate_user: 401'\n\
         exit 1\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let source = include_str!("../../checks/authenticate.rb")
        .replace("/go/src/testapi/bin/authenticate", &script.display().to_string());
    let report = run_source(&source);

    assert_eq!(report.checks[0].status, CheckStatus::Passed);
    assert_eq!(report.checks[0].exit_code, Some(1));
}

#[test]
fn test_relative_program_resolved_from_working_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("input.txt"), "contents").unwrap();

    let file = Parser::new(
        "describe command('cat input.txt') do\n  its('stdout') { should eq 'contents' }\nend",
    )
    .unwrap()
    .parse()
    .unwrap();
    let runner = Runner::with_executor(ProcessExecutor::new().with_working_dir(dir.path()));
    let report = runner.run_file("<input>", &file);

    assert!(report.is_success());
}
