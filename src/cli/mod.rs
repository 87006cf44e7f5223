//! Command line interface definition using clap.
//!
//! [`Cli`] doubles as the layered configuration for the binary: defaults,
//! configuration files, `LOCALEKIT_*` environment variables and explicit
//! flags are merged by [`merge_with_config`], later layers winning.

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::uncased::Uncased;
use ortho_config::{
    ConfigDiscovery, MergeComposer, OrthoConfig, OrthoMergeExt, OrthoResult, sanitize_value,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::LocalizationSettings;
use crate::error::ConfigError;
use crate::locale_code::{DEFAULT_FALLBACK_LOCALE, LocaleCode};

mod parsing;

use parsing::{parse_locale, parse_message_arg};

const CONFIG_ENV_VAR: &str = "LOCALEKIT_CONFIG_PATH";
const ENV_PREFIX: &str = "LOCALEKIT_";

/// Resolve locale preferences and render translations from the command line.
#[derive(Debug, Parser, Serialize, Deserialize, OrthoConfig)]
#[command(author, version, about, long_about = None)]
#[ortho_config(prefix = "LOCALEKIT")]
pub struct Cli {
    /// Preferred locale (for example `de-AT` or `es_MX.UTF-8`).
    ///
    /// When omitted, the host locale is used.
    #[arg(short, long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Locale used when no better match exists.
    #[arg(long, value_name = "LOCALE", value_parser = parse_locale)]
    pub fallback_locale: Option<String>,

    /// Directory of `<code>.json` bundles layered over the built-in ones.
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: Option<PathBuf>,

    /// Switch to the fallback locale when a bundle fails to load.
    #[arg(long)]
    #[ortho_config(default = false)]
    pub fallback_on_load_error: bool,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    #[ortho_config(default = false)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `resolve` when omitted.
    ///
    /// `OrthoConfig` merging ignores this field; CLI parsing supplies it.
    #[serde(skip)]
    #[command(subcommand)]
    #[ortho_config(skip_cli)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Resolve { preference: None });
        }
        self
    }

    /// Convert the merged configuration into context settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the fallback locale is malformed or the
    /// bundle directory is not valid UTF-8.
    pub fn settings(&self) -> Result<LocalizationSettings, ConfigError> {
        let fallback_locale = LocaleCode::new(
            self.fallback_locale
                .as_deref()
                .unwrap_or(DEFAULT_FALLBACK_LOCALE),
        )?;
        let bundle_dir = self
            .bundle_dir
            .clone()
            .map(|dir| {
                camino::Utf8PathBuf::from_path_buf(dir)
                    .map_err(|path| ConfigError::NonUtf8Path { path })
            })
            .transpose()?;
        Ok(LocalizationSettings {
            fallback_locale,
            bundle_dir,
            fallback_on_load_error: self.fallback_on_load_error,
        })
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            locale: None,
            fallback_locale: None,
            bundle_dir: None,
            fallback_on_load_error: false,
            verbose: false,
            command: None,
        }
        .with_default_command()
    }
}

/// A `NAME=VALUE` pair interpolated into a translated message.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub name: String,
    /// Raw value; escaped during interpolation.
    pub value: String,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Commands {
    /// Print the supported locale a preference resolves to.
    Resolve {
        /// Raw preference; defaults to `--locale` or the host locale.
        #[arg(value_name = "PREFERENCE")]
        preference: Option<String>,
    },

    /// Activate the preferred locale and print a translated message.
    Translate {
        /// Dotted message key such as `app.greeting`.
        #[arg(value_name = "KEY")]
        key: String,

        /// Interpolation argument; may be repeated.
        #[arg(long = "arg", value_name = "NAME=VALUE", value_parser = parse_message_arg)]
        args: Vec<MessageArg>,
    },

    /// Print text with HTML-significant characters escaped.
    Escape {
        /// Text to escape.
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// List registered locales and region aliases.
    Locales,
}

/// Parse CLI arguments, returning the parsed struct and the matches needed
/// for configuration merging.
///
/// # Errors
///
/// Returns a `clap::Error` when parsing fails.
pub fn parse_from<I, T>(iter: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    let matches = command.try_get_matches_from_mut(iter)?;
    // Clone matches before from_arg_matches_mut consumes the values.
    let matches_for_merge = matches.clone();
    let mut matches_for_parse = matches;
    let cli = Cli::from_arg_matches_mut(&mut matches_for_parse)
        .map_err(|clap_err| clap_err.with_cmd(&command))?;
    Ok((cli, matches_for_merge))
}

/// Return the prefixed environment provider for CLI configuration.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
}

fn config_discovery() -> ConfigDiscovery {
    ConfigDiscovery::builder("localekit")
        .env_var(CONFIG_ENV_VAR)
        .build()
}

/// Return `true` when no CLI overrides were supplied.
fn is_empty_value(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(map) if map.is_empty())
}

fn cli_overrides_from_matches(cli: &Cli, matches: &ArgMatches) -> OrthoResult<serde_json::Value> {
    let value = sanitize_value(cli)?;
    let mut map = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(Arc::new(ortho_config::OrthoError::Validation {
                key: String::from("cli"),
                message: format!(
                    "expected parsed CLI values to serialize to an object, got {other:?}"
                ),
            }));
        }
    };

    map.remove("command");
    for field in ["verbose", "fallback_on_load_error"] {
        if matches.value_source(field) != Some(ValueSource::CommandLine) {
            map.remove(field);
        }
    }

    Ok(serde_json::Value::Object(map))
}

/// Merge configuration layers over the parsed CLI values.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if layer composition or merging fails.
pub fn merge_with_config(cli: &Cli, matches: &ArgMatches) -> Result<Cli, ConfigError> {
    let command = cli.command.clone();
    let mut errors = Vec::new();
    let mut composer = MergeComposer::with_capacity(4);

    match sanitize_value(&Cli::default()) {
        Ok(value) => composer.push_defaults(value),
        Err(err) => errors.push(err),
    }

    let mut file_layers = config_discovery().compose_layers();
    errors.append(&mut file_layers.required_errors);
    if file_layers.value.is_empty() {
        errors.append(&mut file_layers.optional_errors);
    }
    for layer in file_layers.value {
        composer.push_layer(layer);
    }

    let env_provider = env_provider()
        .map(|key| Uncased::new(key.as_str().to_ascii_uppercase()))
        .split("__");
    match Figment::from(env_provider)
        .extract::<serde_json::Value>()
        .into_ortho_merge()
    {
        Ok(value) => composer.push_environment(value),
        Err(err) => errors.push(err),
    }

    match cli_overrides_from_matches(cli, matches) {
        Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
        Ok(_) => {}
        Err(err) => errors.push(err),
    }

    let composition = LayerComposition::new(composer.layers(), errors);
    let mut merged = composition
        .into_merge_result(Cli::merge_from_layers)
        .map_err(ConfigError::Load)?;
    merged.command = command;
    Ok(merged)
}
