//! Turning raw locale preferences into supported canonical codes.
//!
//! [`LocaleResolver`] is total: every input yields a code with a registered
//! bundle, falling back to the configured fallback locale when nothing
//! better matches. Construction validates that the fallback locale and every
//! alias target are registered, so a resolver that exists can never return
//! an unloadable code.
//!
//! The environment helpers at the bottom of the module read the raw
//! preference from `LOCALEKIT_LOCALE` or the host locale.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::alias_table::RegionAliasTable;
use crate::error::ConfigError;
use crate::locale_code::{LocaleCode, normalize_tag};
use crate::registry::BundleRegistry;

/// Environment variable name used to override the preferred locale.
pub const LOCALEKIT_LOCALE_ENV: &str = "LOCALEKIT_LOCALE";

/// Resolves raw preferences against the alias table and bundle registry.
#[derive(Clone)]
pub struct LocaleResolver {
    aliases: RegionAliasTable,
    registry: Arc<BundleRegistry>,
    fallback: LocaleCode,
}

impl fmt::Debug for LocaleResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleResolver")
            .field("aliases", &self.aliases.len())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl LocaleResolver {
    /// Build a resolver, checking the startup invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MisconfiguredFallback`] when `fallback` has no
    /// registered bundle and [`ConfigError::UnregisteredAliasTarget`] when an
    /// alias maps to an unregistered code.
    pub fn new(
        aliases: RegionAliasTable,
        registry: Arc<BundleRegistry>,
        fallback: LocaleCode,
    ) -> Result<Self, ConfigError> {
        if !registry.is_registered(&fallback) {
            return Err(ConfigError::MisconfiguredFallback { locale: fallback });
        }
        if let Some((alias, target)) = aliases
            .iter()
            .find(|(_, target)| !registry.is_registered(target))
        {
            return Err(ConfigError::UnregisteredAliasTarget {
                alias: alias.to_owned(),
                target: target.clone(),
            });
        }
        Ok(Self {
            aliases,
            registry,
            fallback,
        })
    }

    /// The fallback locale.
    #[must_use]
    pub const fn fallback(&self) -> &LocaleCode {
        &self.fallback
    }

    /// The alias table in use.
    #[must_use]
    pub const fn aliases(&self) -> &RegionAliasTable {
        &self.aliases
    }

    /// Resolve `raw_preference` to a registered canonical code.
    ///
    /// Empty or absent preferences yield the fallback locale. Otherwise the
    /// alias table is consulted, first with the raw value and then with its
    /// normalized BCP 47 form (so `de_AT.UTF-8` behaves like `de-AT`).
    #[must_use]
    pub fn resolve(&self, raw_preference: Option<&str>) -> LocaleCode {
        let Some(raw) = raw_preference.map(str::trim).filter(|raw| !raw.is_empty()) else {
            debug!(fallback = %self.fallback, "no locale preference; using fallback");
            return self.fallback.clone();
        };
        let is_registered = |code: &str| self.registry.is_registered(code);
        let resolved = self.aliases.resolve_alias(raw, is_registered).or_else(|| {
            normalize_tag(raw)
                .filter(|normalized| normalized != raw)
                .and_then(|normalized| self.aliases.resolve_alias(&normalized, is_registered))
        });
        match resolved {
            Some(code) => {
                debug!(preference = raw, locale = %code, "resolved locale preference");
                code
            }
            None => {
                debug!(
                    preference = raw,
                    fallback = %self.fallback,
                    "unsupported locale preference; using fallback"
                );
                self.fallback.clone()
            }
        }
    }
}

/// Read-only environment access used for preference discovery.
pub trait EnvProvider {
    /// Fetch the environment variable value for `key`.
    fn var(&self, key: &str) -> Option<String>;
}

/// Environment provider backed by the process environment.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// System locale provider for the current host.
pub trait SystemLocale {
    /// Return the system locale string when available.
    fn system_locale(&self) -> Option<String>;
}

/// System locale provider backed by `sys-locale`.
#[derive(Debug, Default, Copy, Clone)]
pub struct SysLocale;

impl SystemLocale for SysLocale {
    fn system_locale(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// Read the raw locale preference reported by the environment.
///
/// `LOCALEKIT_LOCALE` wins over the host locale. Blank values are ignored.
/// The result is unvalidated; pass it to [`LocaleResolver::resolve`].
///
/// # Examples
///
/// ```rust
/// use localekit::resolver::{EnvProvider, SystemLocale, preference_from_environment};
///
/// struct NoEnv;
/// impl EnvProvider for NoEnv {
///     fn var(&self, _key: &str) -> Option<String> {
///         None
///     }
/// }
///
/// struct Host(&'static str);
/// impl SystemLocale for Host {
///     fn system_locale(&self) -> Option<String> {
///         Some(self.0.to_owned())
///     }
/// }
///
/// assert_eq!(
///     preference_from_environment(&NoEnv, &Host("nl-BE")).as_deref(),
///     Some("nl-BE")
/// );
/// ```
#[must_use]
pub fn preference_from_environment(
    env: &impl EnvProvider,
    system: &impl SystemLocale,
) -> Option<String> {
    env.var(LOCALEKIT_LOCALE_ENV)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| system.system_locale())
        .filter(|value| !value.trim().is_empty())
}
