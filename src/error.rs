//! Error types for locale resolution and bundle loading.
//!
//! Startup problems surface as [`ConfigError`] and stop initialisation.
//! Loading problems surface as [`BundleError`], which the activation
//! controller records as state rather than propagating. Resolution never
//! fails: an unsupported preference always degrades to the fallback locale,
//! so there is no error variant for it.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others. Since `#[expect]` fails when the lint doesn't
// fire, and `unfulfilled_lint_expectations` cannot be expected, we must use
// `#[allow]` here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::sync::Arc;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::locale_code::LocaleCode;

/// Reasons a string was rejected as a locale code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LocaleCodeError {
    /// The code was empty or whitespace.
    #[error("locale code must not be empty")]
    #[diagnostic(code(localekit::locale_code::empty))]
    Empty,
    /// The code is not a well-formed language identifier.
    #[error("'{code}' is not a valid locale code")]
    #[diagnostic(
        code(localekit::locale_code::invalid),
        help("use a BCP 47 tag such as `en` or `de-AT`")
    )]
    Invalid {
        /// The rejected input.
        code: String,
    },
}

/// Fatal configuration problems detected while assembling the subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The fallback locale has no registered bundle loader.
    #[error("fallback locale '{locale}' is not registered in the bundle registry")]
    #[diagnostic(
        code(localekit::config::misconfigured_fallback),
        help("register a bundle for the fallback locale before building the context")
    )]
    MisconfiguredFallback {
        /// The configured fallback locale.
        locale: LocaleCode,
    },
    /// An alias points at a canonical code with no registered loader.
    #[error("alias '{alias}' targets '{target}', which is not registered")]
    #[diagnostic(code(localekit::config::unregistered_alias_target))]
    UnregisteredAliasTarget {
        /// The raw tag carrying the alias.
        alias: String,
        /// The canonical code the alias resolves to.
        target: LocaleCode,
    },
    /// A configured locale code was malformed.
    #[error("invalid locale code in configuration")]
    #[diagnostic(code(localekit::config::invalid_locale))]
    InvalidLocaleCode(#[from] LocaleCodeError),
    /// An alias table document could not be parsed.
    #[error("failed to parse alias table {origin}")]
    #[diagnostic(code(localekit::config::alias_table))]
    AliasTable {
        /// Where the alias table came from.
        origin: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// An alias table file could not be read.
    #[error("failed to read alias table {path}")]
    #[diagnostic(code(localekit::config::alias_table_io))]
    AliasTableIo {
        /// Path of the alias table file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A configured bundle directory is not valid UTF-8.
    #[error("bundle directory {} is not valid UTF-8", path.display())]
    #[diagnostic(code(localekit::config::non_utf8_path))]
    NonUtf8Path {
        /// The rejected path.
        path: std::path::PathBuf,
    },
    /// Layered configuration could not be merged.
    #[error("failed to load configuration")]
    #[diagnostic(code(localekit::config::load))]
    Load(#[source] Arc<ortho_config::OrthoError>),
}

/// Failures raised while loading a translation bundle.
///
/// The type is `Clone` so a single in-flight load can report the same failure
/// to every caller waiting on it.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum BundleError {
    /// No loader is registered for the requested locale.
    #[error("no bundle is registered for locale '{locale}'")]
    #[diagnostic(code(localekit::bundle::not_registered))]
    NotRegistered {
        /// The requested locale.
        locale: LocaleCode,
    },
    /// The bundle source could not be read.
    #[error("failed to read bundle for '{locale}' from {path}")]
    #[diagnostic(code(localekit::bundle::io))]
    Io {
        /// The locale being loaded.
        locale: LocaleCode,
        /// Path the loader attempted to read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: Arc<std::io::Error>,
    },
    /// The bundle document is not valid JSON.
    #[error("bundle for '{locale}' is not valid JSON")]
    #[diagnostic(code(localekit::bundle::parse))]
    Parse {
        /// The locale being loaded.
        locale: LocaleCode,
        /// Underlying parse failure.
        #[source]
        source: Arc<serde_json::Error>,
    },
    /// The bundle contains a value that is neither a string nor an object.
    #[error("bundle for '{locale}' has a non-string value at '{key}'")]
    #[diagnostic(
        code(localekit::bundle::unsupported_value),
        help("bundle leaves must be strings; nest objects to group keys")
    )]
    UnsupportedValue {
        /// The locale being loaded.
        locale: LocaleCode,
        /// Dotted key of the offending value.
        key: String,
    },
    /// A loader reported a failure of its own.
    #[error("bundle loader for '{locale}' failed: {message}")]
    #[diagnostic(code(localekit::bundle::loader))]
    Loader {
        /// The locale being loaded.
        locale: LocaleCode,
        /// Loader-supplied description.
        message: String,
    },
}

impl BundleError {
    /// Locale the failed load was for.
    #[must_use]
    pub const fn locale(&self) -> &LocaleCode {
        match self {
            Self::NotRegistered { locale }
            | Self::Io { locale, .. }
            | Self::Parse { locale, .. }
            | Self::UnsupportedValue { locale, .. }
            | Self::Loader { locale, .. } => locale,
        }
    }
}
