//! Application-level wiring of the localisation subsystem.
//!
//! [`Localization`] is the explicitly constructed owner of the bundle
//! registry and the single [`ActivationController`]. Building it checks the
//! startup invariants (fallback locale and alias targets registered), so no
//! resolution can happen against a misconfigured registry.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::{debug, info};

use crate::activation::{ActivationController, ActivationOptions, ActiveLocaleState};
use crate::alias_table::RegionAliasTable;
use crate::bundle::Bundle;
use crate::bundle_source::{register_builtin, register_directory};
use crate::error::{BundleError, ConfigError};
use crate::locale_code::LocaleCode;
use crate::registry::{BundleFuture, BundleLoader, BundleRegistry};
use crate::resolver::{EnvProvider, LocaleResolver, SystemLocale, preference_from_environment};

/// Plain settings consumed by [`Localization::from_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizationSettings {
    /// Locale used when resolution finds nothing better.
    pub fallback_locale: LocaleCode,
    /// Directory of `<code>.json` bundles layered over the built-in ones.
    pub bundle_dir: Option<Utf8PathBuf>,
    /// Switch to the fallback locale when a bundle fails to load.
    pub fallback_on_load_error: bool,
}

/// Builder for [`Localization`].
///
/// Registration order, later sources replacing earlier ones for the same
/// code: built-in bundles, the bundle directory, then explicit
/// [`Self::register`] calls. Region aliases registered with
/// [`Self::register_region`] are applied last.
#[must_use]
pub struct LocalizationBuilder {
    builtin: bool,
    bundle_dir: Option<Utf8PathBuf>,
    aliases: RegionAliasTable,
    fallback: LocaleCode,
    options: ActivationOptions,
    loaders: Vec<(LocaleCode, BundleLoader)>,
    regions: Vec<(LocaleCode, LocaleCode)>,
}

impl Default for LocalizationBuilder {
    fn default() -> Self {
        Self {
            builtin: false,
            bundle_dir: None,
            aliases: RegionAliasTable::builtin(),
            fallback: LocaleCode::default(),
            options: ActivationOptions::default(),
            loaders: Vec::new(),
            regions: Vec::new(),
        }
    }
}

impl LocalizationBuilder {
    /// Register the bundles embedded in the crate.
    pub const fn with_builtin_bundles(mut self) -> Self {
        self.builtin = true;
        self
    }

    /// Register every bundle in `dir` and merge its `aliases.json`.
    pub fn with_bundle_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.bundle_dir = Some(dir.into());
        self
    }

    /// Replace the alias table (the built-in table is the default).
    pub fn with_aliases(mut self, aliases: RegionAliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the fallback locale (default `en`).
    pub fn with_fallback(mut self, fallback: LocaleCode) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set controller options.
    pub const fn with_options(mut self, options: ActivationOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a custom loader for `code`.
    pub fn register<F>(mut self, code: LocaleCode, loader: F) -> Self
    where
        F: Fn() -> BundleFuture + Send + Sync + 'static,
    {
        self.loaders.push((code, Arc::new(loader)));
        self
    }

    /// Register `region` with the loader of `base`.
    pub fn register_region(mut self, region: LocaleCode, base: LocaleCode) -> Self {
        self.regions.push((region, base));
        self
    }

    /// Assemble the subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bundle directory or its alias file
    /// cannot be read, a region's base is unregistered, or the startup
    /// invariants fail.
    pub fn build(self) -> Result<Localization, ConfigError> {
        let registry = Arc::new(BundleRegistry::new());
        if self.builtin {
            register_builtin(&registry);
        }
        let mut aliases = self.aliases;
        if let Some(dir) = &self.bundle_dir {
            if let Some(extra) = register_directory(&registry, dir)? {
                debug!(dir = %dir, aliases = extra.len(), "merging directory alias table");
                aliases = aliases.merged_with(extra);
            }
        }
        for (code, loader) in self.loaders {
            registry.register_shared(code, loader);
        }
        for (region, base) in self.regions {
            registry
                .register_alias(region.clone(), &base)
                .map_err(|_| ConfigError::UnregisteredAliasTarget {
                    alias: region.to_string(),
                    target: base,
                })?;
        }
        let resolver = LocaleResolver::new(aliases, Arc::clone(&registry), self.fallback)?;
        info!(
            fallback = %resolver.fallback(),
            locales = registry.registered_locales().len(),
            "localisation initialised"
        );
        let controller = Arc::new(ActivationController::new(
            resolver,
            Arc::clone(&registry),
            self.options,
        ));
        Ok(Localization {
            registry,
            controller,
        })
    }
}

/// Process-wide localisation context.
///
/// Cloning is cheap and every clone shares the same registry and controller.
///
/// # Examples
///
/// ```rust
/// use localekit::{LoadStatus, Localization};
///
/// let l10n = Localization::builder()
///     .with_builtin_bundles()
///     .build()
///     .expect("built-in configuration is valid");
/// let state = futures::executor::block_on(l10n.controller().activate(Some("es-MX")));
/// assert_eq!(state.current_locale.as_str(), "es");
/// assert_eq!(state.load_status, LoadStatus::Loaded);
/// ```
#[derive(Debug, Clone)]
pub struct Localization {
    registry: Arc<BundleRegistry>,
    controller: Arc<ActivationController>,
}

impl Localization {
    /// Start building a context.
    pub fn builder() -> LocalizationBuilder {
        LocalizationBuilder::default()
    }

    /// Build a context with the built-in bundles and `settings`.
    ///
    /// # Errors
    ///
    /// See [`LocalizationBuilder::build`].
    pub fn from_settings(settings: &LocalizationSettings) -> Result<Self, ConfigError> {
        let mut builder = Self::builder()
            .with_builtin_bundles()
            .with_fallback(settings.fallback_locale.clone())
            .with_options(ActivationOptions {
                fallback_on_load_error: settings.fallback_on_load_error,
            });
        if let Some(dir) = &settings.bundle_dir {
            builder = builder.with_bundle_dir(dir.clone());
        }
        builder.build()
    }

    /// The shared bundle registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<BundleRegistry> {
        &self.registry
    }

    /// The activation controller.
    #[must_use]
    pub const fn controller(&self) -> &Arc<ActivationController> {
        &self.controller
    }

    /// Resolve a raw preference without changing the active locale.
    #[must_use]
    pub fn resolve(&self, raw_preference: Option<&str>) -> LocaleCode {
        self.controller.resolver().resolve(raw_preference)
    }

    /// Activate the locale reported by the environment.
    pub async fn activate_from_environment(
        &self,
        env: &impl EnvProvider,
        system: &impl SystemLocale,
    ) -> ActiveLocaleState {
        let preference = preference_from_environment(env, system);
        debug!(preference = ?preference, "read environment locale preference");
        self.controller.activate(preference.as_deref()).await
    }

    /// Load the fallback bundle so translations can fall back to it.
    ///
    /// # Errors
    ///
    /// Returns the fallback loader's [`BundleError`].
    pub async fn preload_fallback(&self) -> Result<Arc<Bundle>, BundleError> {
        let fallback = self.controller.resolver().fallback().clone();
        self.registry.load(&fallback).await
    }
}
