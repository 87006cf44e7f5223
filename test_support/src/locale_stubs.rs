//! Stub locale providers for tests.
//!
//! These implement the resolver's environment traits so tests can inject a
//! deterministic `LOCALEKIT_LOCALE` value and host locale.

use localekit::resolver::{EnvProvider, LOCALEKIT_LOCALE_ENV, SystemLocale};

/// Stub environment provider answering only `LOCALEKIT_LOCALE`.
#[derive(Debug, Default, Clone)]
pub struct StubEnv {
    /// Value returned for `LOCALEKIT_LOCALE`.
    pub locale: Option<String>,
}

impl StubEnv {
    /// Create a stub environment with the provided locale.
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
        }
    }
}

impl EnvProvider for StubEnv {
    fn var(&self, key: &str) -> Option<String> {
        (key == LOCALEKIT_LOCALE_ENV)
            .then(|| self.locale.clone())
            .flatten()
    }
}

/// Stub host locale provider.
#[derive(Debug, Default, Clone)]
pub struct StubSystemLocale {
    /// Value returned as the host locale.
    pub locale: Option<String>,
}

impl StubSystemLocale {
    /// Create a stub system locale with the provided value.
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
        }
    }
}

impl SystemLocale for StubSystemLocale {
    fn system_locale(&self) -> Option<String> {
        self.locale.clone()
    }
}
