#![warn(missing_docs)]
//! proctime CLI Library
//!
//! Command-line front end of the harness. `proctime::run()` parses flags,
//! merges them with `proctime.toml`, times the command and prints the report.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     proctime_cli::run()
//! }
//! ```

mod cmdline;
mod config;
mod harness;
mod io_state;
mod launcher;

pub use cmdline::{CommandLine, CommandLineError, DEFAULT_MAX_COMMAND_LINE};
pub use config::*;
pub use harness::{FatalError, Harness, HarnessError, HarnessOptions, RunSummary};
pub use io_state::{IoState, IoStateError};
pub use launcher::{ChildOutcome, LaunchError, Launcher};

use clap::Parser;
use clap::error::ContextKind;
use proctime_report::OutputFormat;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "PROCTIME_LOG";

/// Usage text printed for `--help` and invalid invocations
pub const USAGE: &str = "usage: proctime [-v | --version] [-h | --help] [-s | --show-output]\n\
                         \x20               [--format <human|json>] [--verbose]\n\
                         \x20               <command> [<args>]\n\
                         \x20      proctime --init-config\n";

/// proctime CLI arguments
///
/// Help and version are handled by hand: help goes to stderr with a failure
/// status, which clap's built-in flags do not do.
#[derive(Parser, Debug)]
#[command(name = "proctime", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Print usage and exit with failure
    #[arg(short = 'h', long)]
    pub help: bool,

    /// Do not suppress the command's output
    #[arg(short = 's', long = "show-output", short_alias = 'o', alias = "output")]
    pub show_output: bool,

    /// Report format: human or json
    #[arg(long)]
    pub format: Option<String>,

    /// Debug logging on stderr
    #[arg(long)]
    pub verbose: bool,

    /// Write a default proctime.toml to the current directory and exit
    #[arg(long)]
    pub init_config: bool,

    /// Command to time, followed by its arguments
    #[arg(trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<OsString>,
}

/// Version line printed by `--version`
pub fn version_string() -> String {
    format!("proctime version {}", env!("CARGO_PKG_VERSION"))
}

/// Run the proctime CLI with the process arguments.
pub fn run() -> ExitCode {
    run_from(std::env::args_os())
}

/// Run the proctime CLI with explicit arguments (first item is the program name).
pub fn run_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    ExitCode::from(exit_status_from(args))
}

/// Same as [`run_from`], returning the raw process exit status.
pub fn exit_status_from<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    const FAILURE: u8 = 1;
    let argv: Vec<OsString> = args.into_iter().map(Into::into).collect();

    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", describe_parse_error(&e));
            eprint!("{}", USAGE);
            return FAILURE;
        }
    };

    if cli.version {
        println!("{}", version_string());
        return 0;
    }

    if cli.init_config {
        let written = std::env::current_dir()
            .map_err(anyhow::Error::from)
            .and_then(|dir| ProctimeConfig::write_default(dir));
        return match written {
            Ok(path) => {
                println!("Created {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("error: {:#}", e);
                FAILURE
            }
        };
    }

    if cli.help || cli.command.is_empty() {
        eprint!("{}", USAGE);
        return FAILURE;
    }

    init_logging(cli.verbose);

    match run_with_cli(&cli, &argv) {
        Ok(code) => (code & 0xff) as u8,
        Err(HarnessError::Fatal(fatal)) => fail_fast(fatal),
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("Fatal error: {}", e);
            FAILURE
        }
    }
}

/// Run with pre-parsed arguments. `argv` is the full argument vector that
/// `cli` was parsed from; the command starts after the last flag.
///
/// # Returns
/// The exit code the harness should terminate with.
pub fn run_with_cli(cli: &Cli, argv: &[OsString]) -> Result<i32, HarnessError> {
    let config = ProctimeConfig::discover()
        .map_err(HarnessError::Config)?
        .unwrap_or_default();

    let options = build_options(cli, &config);

    let start = argv.len() - cli.command.len();
    let command = CommandLine::build(argv, start, config.runner.max_command_line)?;
    tracing::debug!(command = %command, show_output = options.show_output, "timing command");

    let harness = Harness::new(options);
    let summary = harness.execute(&command)?;
    harness.print_report(&summary.report)?;

    Ok(summary.outcome.harness_exit_code())
}

/// One-line parse error naming the offending argument when clap knows it.
fn describe_parse_error(e: &clap::Error) -> String {
    match e.get(ContextKind::InvalidArg) {
        Some(arg) => format!("error: {}: {}", e.kind(), arg),
        None => format!("error: {}", e.kind()),
    }
}

/// Layer flags over `proctime.toml` values.
fn build_options(cli: &Cli, config: &ProctimeConfig) -> HarnessOptions {
    let format_name = cli.format.as_deref().unwrap_or(&config.output.format);
    let format = format_name.parse::<OutputFormat>().unwrap_or_else(|e| {
        eprintln!("Warning: {}; using human output", e);
        OutputFormat::Human
    });

    HarnessOptions {
        show_output: cli.show_output || config.runner.show_output,
        format,
        stream: config.output.stream,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "proctime=debug"
    } else {
        "proctime=warn"
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Terminate on a fatal error, printing only when the console is known to be
/// attached again.
fn fail_fast(fatal: FatalError) -> ! {
    if fatal.output_restored() {
        tracing::error!(error = ?fatal, "fatal error, aborting");
        eprintln!("Fatal error: {}", fatal);
    }
    std::process::abort()
}
