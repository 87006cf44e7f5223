//! Terminal rendering of failures that carry diagnostic metadata.

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

use super::RunnerError;
use crate::error::{BundleError, ConfigError};

/// Render `diagnostic` with its code, cause chain and help text.
#[must_use]
pub fn render_diagnostic(diagnostic: &dyn Diagnostic) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut rendered = String::new();
    if handler.render_report(&mut rendered, diagnostic).is_err() {
        rendered = diagnostic.to_string();
    }
    rendered
}

/// Render the outermost diagnostic in `err`'s chain.
///
/// Falls back to the plain `{:#}` chain when no layer carries a diagnostic.
#[must_use]
pub fn render_error(err: &anyhow::Error) -> String {
    err.chain()
        .find_map(as_diagnostic)
        .map_or_else(|| format!("{err:#}"), render_diagnostic)
}

fn as_diagnostic<'a>(
    cause: &'a (dyn std::error::Error + 'static),
) -> Option<&'a dyn Diagnostic> {
    if let Some(err) = cause.downcast_ref::<RunnerError>() {
        return Some(err);
    }
    if let Some(err) = cause.downcast_ref::<ConfigError>() {
        return Some(err);
    }
    cause
        .downcast_ref::<BundleError>()
        .map(|err| err as &dyn Diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale_code::LocaleCode;
    use anyhow::Context;

    #[test]
    fn diagnostics_render_their_code_and_help() {
        let err = RunnerError::MissingMessage {
            key: "no.such.key".to_owned(),
            locale: LocaleCode::default(),
        };
        let rendered = render_diagnostic(&err);
        assert!(rendered.contains("localekit::runner::missing_message"));
        assert!(rendered.contains("message 'no.such.key' is missing"));
        assert!(rendered.contains("localekit locales"));
    }

    #[test]
    fn context_layers_are_skipped_to_reach_the_diagnostic() {
        let source: anyhow::Result<()> = Err(ConfigError::MisconfiguredFallback {
            locale: LocaleCode::new("fr").expect("valid code"),
        }
        .into());
        let err = source
            .context("failed to initialise localisation")
            .expect_err("error is kept");
        let rendered = render_error(&err);
        assert!(rendered.contains("localekit::config::misconfigured_fallback"));
        assert!(rendered.contains("fallback locale 'fr'"));
    }

    #[test]
    fn plain_errors_render_their_chain() {
        let err = anyhow::anyhow!("disk full").context("write locale list");
        assert_eq!(render_error(&err), "write locale list: disk full");
    }
}
