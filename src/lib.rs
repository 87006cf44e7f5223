//! Localekit core library.
//!
//! Resolves raw locale preferences (browser tags, `LANG` values, user
//! settings) to a supported canonical code, loads translation bundles on
//! demand with at most one fetch per locale, and tracks the active locale
//! through an observable `Unset`/`Loading`/`Loaded`/`Error` state.
//!
//! [`Localization`] wires the pieces together; the individual modules are
//! public for callers that need custom registries or loaders.

pub mod activation;
pub mod alias_table;
pub mod bundle;
pub mod bundle_source;
pub mod cli;
pub mod context;
pub mod error;
pub mod locale_code;
mod observer;
pub mod registry;
pub mod resolver;
pub mod runner;
pub mod sanitize;

pub use activation::{ActivationController, ActivationOptions, ActiveLocaleState, LoadStatus};
pub use alias_table::RegionAliasTable;
pub use bundle::Bundle;
pub use context::{Localization, LocalizationBuilder, LocalizationSettings};
pub use error::{BundleError, ConfigError, LocaleCodeError};
pub use locale_code::LocaleCode;
pub use observer::Subscription;
pub use registry::BundleRegistry;
pub use resolver::LocaleResolver;
pub use sanitize::escape;
