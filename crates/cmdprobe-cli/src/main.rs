//! cmdprobe CLI
//!
//! Loads check files, runs every described command and reports the outcome.
//! Exit status: 0 when every check passed, 1 when an assertion failed, 2 when
//! a check file or a command could not be processed at all.

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use cmdprobe_ast::CheckFile;
use cmdprobe_parser::Parser;
use cmdprobe_runner::{ProcessExecutor, Report, Runner};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

const EXIT_PASSED: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(Debug)]
struct Options {
    files: Vec<PathBuf>,
    format: Format,
    chdir: Option<PathBuf>,
    list: bool,
    verbose: u8,
    quiet: bool,
}

impl Options {
    fn from_matches(matches: &ArgMatches) -> Self {
        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("json") => Format::Json,
            _ => Format::Text,
        };
        Self {
            files: matches
                .get_many::<PathBuf>("files")
                .map(|files| files.cloned().collect())
                .unwrap_or_default(),
            format,
            chdir: matches.get_one::<PathBuf>("chdir").cloned(),
            list: matches.get_flag("list"),
            verbose: matches.get_count("verbose"),
            quiet: matches.get_flag("quiet"),
        }
    }
}

fn cli() -> Command {
    Command::new("cmdprobe")
        .version(clap::crate_version!())
        .about("Run declarative checks against the output of external commands")
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .help("Check files to run")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Report format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("chdir")
                .short('C')
                .long("chdir")
                .value_name("DIR")
                .help("Working directory for the commands under test")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("Parse and print the checks without running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print the summary line")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

fn main() {
    let options = Options::from_matches(&cli().get_matches());
    init_logging(options.verbose, options.quiet);

    match run(&options) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(EXIT_ERROR);
        }
    }
}

/// Log filter from `CMDPROBE_LOG`, falling back to the `-v`/`-q` level
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_env("CMDPROBE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(options: &Options) -> Result<i32, anyhow::Error> {
    let mut files = Vec::with_capacity(options.files.len());
    for path in &options.files {
        files.push((path.display().to_string(), load_file(path)?));
    }

    if options.list {
        print!("{}", render::listing(&files));
        return Ok(EXIT_PASSED);
    }

    let mut executor = ProcessExecutor::new();
    if let Some(dir) = &options.chdir {
        executor = executor.with_working_dir(dir);
    }
    let runner = Runner::with_executor(executor);

    let reports: Vec<Report> = files
        .iter()
        .map(|(source, file)| {
            debug!(source = %source, checks = file.checks.len(), "running check file");
            runner.run_file(source, file)
        })
        .collect();

    match options.format {
        Format::Text => print!("{}", render::text(&reports, options.quiet)),
        Format::Json => println!("{}", render::json(&reports)?),
    }

    Ok(exit_code(&reports))
}

fn load_file(path: &Path) -> Result<CheckFile, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read check file {}", path.display()))?;
    let parser = Parser::new_with_filename(&content, &path.display().to_string())?;
    Ok(parser.parse()?)
}

/// Infrastructure errors take precedence over assertion failures
fn exit_code(reports: &[Report]) -> i32 {
    let mut code = EXIT_PASSED;
    for report in reports {
        let summary = report.summary();
        if summary.errors > 0 {
            return EXIT_ERROR;
        }
        if summary.failed > 0 {
            code = EXIT_FAILED;
        }
    }
    code
}
