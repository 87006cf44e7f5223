//! Application entry point.
//!
//! Parses command-line arguments, merges layered configuration and delegates
//! execution to [`runner::run`]. Failures are logged and then rendered as
//! diagnostics on stderr.

use localekit::{cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let (parsed, matches) = match cli::parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    };
    let verbose = parsed.verbose;
    let merged = cli::merge_with_config(&parsed, &matches);
    let max_level = match &merged {
        Ok(config) if config.verbose => Level::DEBUG,
        Err(_) if verbose => Level::DEBUG,
        _ => Level::ERROR,
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();

    let config = match merged {
        Ok(config) => config.with_default_command(),
        Err(err) => {
            tracing::error!(error = %err, "configuration failed");
            report(&runner::render_diagnostic(&err));
            return ExitCode::FAILURE;
        }
    };
    match runner::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "runner failed");
            report(&runner::render_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn report(rendered: &str) {
    let mut stderr = io::stderr().lock();
    if writeln!(stderr, "{rendered}").is_err() {
        tracing::debug!("stderr closed before the diagnostic was written");
    }
}
