//! CLI parsing helpers for clap value parsers.

use crate::locale_code::LocaleCode;

use super::MessageArg;

/// Validate a canonical locale code such as the fallback locale.
///
/// Raw preferences (`--locale`) are deliberately not parsed here: the
/// resolver accepts any string and falls back on its own.
pub(super) fn parse_locale(s: &str) -> Result<String, String> {
    LocaleCode::new(s)
        .map(String::from)
        .map_err(|err| format!("invalid locale '{}': {err}", s.trim()))
}

/// Parse a `NAME=VALUE` interpolation argument.
pub(super) fn parse_message_arg(s: &str) -> Result<MessageArg, String> {
    let Some((name, value)) = s.split_once('=') else {
        return Err(format!("argument '{s}' must have the form NAME=VALUE"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("argument '{s}' has an empty name"));
    }
    Ok(MessageArg {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}
