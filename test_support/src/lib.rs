//! Shared helpers for the localekit test suites.
//!
//! Provides environment guards, stub locale providers, instrumented bundle
//! loaders and temporary bundle directories.

pub mod bundle_dir;
pub mod loaders;
pub mod locale_stubs;
pub mod scoped_env;

pub use bundle_dir::BundleDir;
pub use loaders::{CountingLoader, GatedLoader};
pub use locale_stubs::{StubEnv, StubSystemLocale};
pub use scoped_env::ScopedEnv;

use localekit::LocaleCode;

/// Parse `raw` as a [`LocaleCode`], panicking on invalid input.
///
/// # Panics
///
/// Panics when `raw` is not a valid locale code.
#[must_use]
pub fn code(raw: &str) -> LocaleCode {
    LocaleCode::new(raw).unwrap_or_else(|err| panic!("invalid test locale {raw:?}: {err}"))
}
