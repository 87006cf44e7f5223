//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

use crate::error::BundleError;
use crate::locale_code::LocaleCode;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// Neither the active nor the fallback bundle has the requested key.
    #[error("message '{key}' is missing for locale '{locale}'")]
    #[diagnostic(
        code(localekit::runner::missing_message),
        help("run `localekit locales` to list the available locales")
    )]
    MissingMessage {
        /// The requested message key.
        key: String,
        /// The active locale.
        locale: LocaleCode,
    },
    /// The preferred locale's bundle failed to load.
    #[error("failed to activate locale '{locale}'")]
    #[diagnostic(code(localekit::runner::activation_failed))]
    ActivationFailed {
        /// The locale that failed.
        locale: LocaleCode,
        /// Underlying bundle failure.
        #[source]
        source: BundleError,
    },
}
