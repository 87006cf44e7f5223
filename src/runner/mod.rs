//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! builds the localisation context from the merged configuration and runs
//! the requested command to completion.

mod error;
mod report;

pub use error::RunnerError;
pub use report::{render_diagnostic, render_error};

use anyhow::{Context, Result};
use futures::executor::block_on;
use std::io::{self, Write};
use tracing::{debug, info};

use crate::activation::LoadStatus;
use crate::cli::{Cli, Commands, MessageArg};
use crate::context::Localization;
use crate::resolver::{SysLocale, SystemEnv, preference_from_environment};
use crate::sanitize::escape;

/// Execute the parsed [`Cli`] command, writing results to `out`.
///
/// # Errors
///
/// Returns an error if the context cannot be built, the preferred locale
/// fails to load, a message is missing, or writing output fails.
pub fn run_with_output(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Resolve { preference: None });
    if let Commands::Escape { text } = &command {
        writeln!(out, "{}", escape(text)).context("write escaped text")?;
        return Ok(());
    }

    let settings = cli.settings().context("invalid localisation settings")?;
    let l10n = Localization::from_settings(&settings)
        .context("failed to initialise localisation")?;
    let preference = preferred_locale(cli);
    debug!(preference = ?preference, "using locale preference");

    match command {
        Commands::Resolve { preference: explicit } => {
            let raw = explicit.or(preference);
            let code = l10n.resolve(raw.as_deref());
            writeln!(out, "{code}").context("write resolved locale")?;
        }
        Commands::Translate { key, args } => {
            let text = translate(&l10n, preference.as_deref(), &key, &args)?;
            writeln!(out, "{text}").context("write translated message")?;
        }
        Commands::Locales => {
            for code in l10n.registry().registered_locales() {
                writeln!(out, "{code}").context("write locale list")?;
            }
            for (alias, target) in l10n.controller().resolver().aliases().iter() {
                writeln!(out, "{alias} -> {target}").context("write alias list")?;
            }
        }
        Commands::Escape { .. } => {}
    }
    Ok(())
}

/// Execute the parsed [`Cli`] command against standard output.
///
/// # Errors
///
/// See [`run_with_output`].
pub fn run(cli: &Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();
    run_with_output(cli, &mut stdout)
}

fn preferred_locale(cli: &Cli) -> Option<String> {
    cli.locale
        .clone()
        .filter(|locale| !locale.trim().is_empty())
        .or_else(|| preference_from_environment(&SystemEnv, &SysLocale))
}

fn translate(
    l10n: &Localization,
    preference: Option<&str>,
    key: &str,
    args: &[MessageArg],
) -> Result<String> {
    let controller = l10n.controller();
    let state = block_on(async {
        if let Err(err) = l10n.preload_fallback().await {
            debug!(error = %err, "fallback bundle unavailable");
        }
        controller.activate(preference).await
    });
    if state.load_status == LoadStatus::Error {
        if let Some(source) = controller.last_error() {
            return Err(RunnerError::ActivationFailed {
                locale: source.locale().clone(),
                source,
            }
            .into());
        }
    }
    info!(locale = %state.current_locale, key, "rendering message");
    let pairs: Vec<(&str, &str)> = args
        .iter()
        .map(|arg| (arg.name.as_str(), arg.value.as_str()))
        .collect();
    controller.translate(key, &pairs).ok_or_else(|| {
        RunnerError::MissingMessage {
            key: key.to_owned(),
            locale: state.current_locale,
        }
        .into()
    })
}
