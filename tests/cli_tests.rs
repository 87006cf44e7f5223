//! End-to-end tests for the `localekit` binary and its layered configuration.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use localekit::ConfigError;
use localekit::cli::{Commands, merge_with_config, parse_from};
use predicates::prelude::*;
use rstest::rstest;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;
use test_support::ScopedEnv;

fn localekit() -> Result<Command> {
    let mut cmd = Command::cargo_bin("localekit").context("locate localekit binary")?;
    cmd.env_clear();
    Ok(cmd)
}

#[rstest]
#[case(&["resolve", "de-AT"], "de\n")]
#[case(&["resolve", "EN-gb"], "en\n")]
#[case(&["resolve", "sv-SE"], "en\n")]
#[case(&["--fallback-locale", "es", "resolve", "sv-SE"], "es\n")]
#[case(&["escape", "<b>\"hi\"</b>"], "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;\n")]
#[case(&["--locale", "nl-BE", "translate", "nav.home"], "Start\n")]
#[case(
    &["--locale", "es-AR", "translate", "profile.friend_request", "--arg", "user=<Ana>"],
    "&lt;Ana&gt; te envió una solicitud de amistad.\n"
)]
fn commands_print_their_result(#[case] args: &[&str], #[case] expected: &str) -> Result<()> {
    localekit()?
        .args(args)
        .assert()
        .success()
        .stdout(expected.to_owned());
    Ok(())
}

#[test]
fn translate_falls_back_to_the_fallback_bundle() -> Result<()> {
    localekit()?
        .args(["--locale", "nl", "translate", "profile.friend_request"])
        .args(["--arg", "user=Joost"])
        .assert()
        .success()
        .stdout("Joost sent you a friend request.\n");
    Ok(())
}

#[test]
fn environment_locale_drives_the_default_command() -> Result<()> {
    localekit()?
        .env("LOCALEKIT_LOCALE", "es-MX")
        .assert()
        .success()
        .stdout("es\n");
    Ok(())
}

#[test]
fn config_file_supplies_the_fallback_locale() -> Result<()> {
    let temp = tempdir().context("create config dir")?;
    let config_path = temp.path().join("localekit.toml");
    fs::write(&config_path, "fallback_locale = \"de\"\n").context("write config")?;
    localekit()?
        .env("LOCALEKIT_CONFIG_PATH", &config_path)
        .args(["resolve", "ja-JP"])
        .assert()
        .success()
        .stdout("de\n");
    Ok(())
}

#[test]
fn locales_lists_builtin_codes() -> Result<()> {
    localekit()?
        .arg("locales")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("de\nen\nes\nnl\n"))
        .stdout(predicate::str::contains("es-MX -> es"));
    Ok(())
}

#[rstest]
#[case(&["--fallback-locale", "fr", "locales"], "fallback locale 'fr'")]
#[case(&["--locale", "de", "translate", "no.such.key"], "message 'no.such.key' is missing")]
#[case(&["--bundle-dir", "/definitely/not/here", "locales"], "failed to read alias table")]
fn failures_exit_non_zero(#[case] args: &[&str], #[case] message: &str) -> Result<()> {
    localekit()?
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains(message))
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn invalid_fallback_flags_are_rejected_by_the_parser() -> Result<()> {
    localekit()?
        .args(["--fallback-locale", "not a locale", "locales"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid locale"));
    Ok(())
}

#[test]
#[serial]
fn merge_applies_file_then_environment_then_flags() -> Result<()> {
    let temp = tempdir().context("create config dir")?;
    let config_path = temp.path().join("localekit.toml");
    fs::write(
        &config_path,
        "fallback_locale = \"nl\"\nfallback_on_load_error = true\nlocale = \"de-AT\"\n",
    )
    .context("write config")?;
    let _env = ScopedEnv::lock()
        .set("LOCALEKIT_CONFIG_PATH", &config_path)
        .set("LOCALEKIT_FALLBACK_LOCALE", "es")
        .remove("LOCALEKIT_LOCALE")
        .remove("LOCALEKIT_VERBOSE");

    let (cli, matches) = parse_from(["localekit", "resolve"]).context("parse arguments")?;
    let merged = merge_with_config(&cli, &matches).context("merge layers")?;
    ensure!(merged.fallback_locale.as_deref() == Some("es"), "environment beats file");
    ensure!(merged.fallback_on_load_error, "file beats defaults");
    ensure!(merged.locale.as_deref() == Some("de-AT"), "file supplies locale");
    ensure!(!merged.verbose);
    ensure!(merged.command == Some(Commands::Resolve { preference: None }));

    let (cli, matches) = parse_from(["localekit", "--fallback-locale", "de", "--verbose"])
        .context("parse arguments with flags")?;
    let merged = merge_with_config(&cli, &matches).context("merge layers with flags")?;
    ensure!(merged.fallback_locale.as_deref() == Some("de"), "flags beat environment");
    ensure!(merged.verbose);
    ensure!(merged.command.is_none(), "default command is applied by the caller");
    Ok(())
}

#[test]
#[serial]
fn environment_locale_populates_the_preference() -> Result<()> {
    let _env = ScopedEnv::lock()
        .set("LOCALEKIT_LOCALE", "nl_BE.UTF-8")
        .remove("LOCALEKIT_CONFIG_PATH")
        .remove("LOCALEKIT_FALLBACK_LOCALE");
    let (cli, matches) = parse_from(["localekit"]).context("parse arguments")?;
    let merged = merge_with_config(&cli, &matches)
        .context("merge layers")?
        .with_default_command();
    ensure!(merged.locale.as_deref() == Some("nl_BE.UTF-8"));
    let settings = merged.settings().context("derive settings")?;
    ensure!(settings.fallback_locale.as_str() == "en");
    Ok(())
}

#[test]
#[serial]
fn malformed_configuration_is_a_load_error() -> Result<()> {
    let temp = tempdir().context("create config dir")?;
    let config_path = temp.path().join("localekit.toml");
    fs::write(&config_path, "fallback_on_load_error = \"sometimes\"\n")
        .context("write config")?;
    let _env = ScopedEnv::lock()
        .set("LOCALEKIT_CONFIG_PATH", &config_path)
        .remove("LOCALEKIT_FALLBACK_LOCALE")
        .remove("LOCALEKIT_FALLBACK_ON_LOAD_ERROR");

    let (cli, matches) = parse_from(["localekit", "resolve"]).context("parse arguments")?;
    let result = merge_with_config(&cli, &matches);
    ensure!(
        matches!(result, Err(ConfigError::Load(_))),
        "expected a load error, got {result:?}"
    );
    Ok(())
}

#[test]
fn malformed_configuration_is_reported_as_a_diagnostic() -> Result<()> {
    let temp = tempdir().context("create config dir")?;
    let config_path = temp.path().join("localekit.toml");
    fs::write(&config_path, "fallback_on_load_error = \"sometimes\"\n")
        .context("write config")?;
    localekit()?
        .env("LOCALEKIT_CONFIG_PATH", &config_path)
        .arg("locales")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("configuration failed"))
        .stderr(predicate::str::contains("localekit::config::load"));
    Ok(())
}
