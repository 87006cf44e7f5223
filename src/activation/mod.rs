//! Active locale state and the controller that owns it.
//!
//! [`ActivationController`] is the single writer of [`ActiveLocaleState`].
//! Every `activate`/`set_locale` call takes a fresh request token; when the
//! bundle load finishes, the outcome is applied only if no newer request has
//! started in the meantime. A slow load abandoned by a later switch can
//! therefore never overwrite the newer state.
//!
//! Transitions: `Unset`, `Loaded` and `Error` move to `Loading` on a new
//! request; `Loading` settles in `Loaded` or `Error`. No state is terminal,
//! and `Error` never reaches `Loaded` without passing through `Loading`.
//!
//! Observers see transitions in the order they were applied, even when
//! requests race on several threads. Callbacks run after the state lock is
//! released but while notification is serialised, so a callback may read
//! the controller yet must not start a new activation synchronously.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::bundle::{Bundle, interpolate};
use crate::error::BundleError;
use crate::locale_code::LocaleCode;
use crate::observer::{ObserverList, Subscription};
use crate::registry::BundleRegistry;
use crate::resolver::LocaleResolver;

/// Progress of loading the active locale's bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadStatus {
    /// No locale has been selected yet.
    #[default]
    Unset,
    /// The bundle for the current locale is being fetched.
    Loading,
    /// The bundle for the current locale is available.
    Loaded,
    /// The last fetch for the current locale failed.
    Error,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unset => "unset",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        })
    }
}

/// Snapshot of the active locale and its load progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLocaleState {
    /// The selected locale, or the fallback locale before any selection.
    pub current_locale: LocaleCode,
    /// Load progress for `current_locale`.
    pub load_status: LoadStatus,
}

/// Behaviour switches for the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationOptions {
    /// Switch to the fallback locale when a non-fallback bundle fails to load.
    ///
    /// Off by default: a failed load is reported as [`LoadStatus::Error`]
    /// with the attempted locale left in place.
    pub fallback_on_load_error: bool,
}

struct ControllerState {
    snapshot: ActiveLocaleState,
    bundle: Option<Arc<Bundle>>,
    last_error: Option<BundleError>,
    latest_request: u64,
}

/// Owner of the process-wide active locale.
///
/// Construct one per application and share it (for example behind an `Arc`
/// in [`crate::Localization`]); all mutation goes through its methods.
pub struct ActivationController {
    resolver: LocaleResolver,
    registry: Arc<BundleRegistry>,
    options: ActivationOptions,
    state: Mutex<ControllerState>,
    // Taken before `state` and held until observers return.
    notify: Mutex<()>,
    observers: Arc<ObserverList>,
}

impl fmt::Debug for ActivationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationController")
            .field("state", &self.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ActivationController {
    /// Create a controller in the [`LoadStatus::Unset`] state.
    #[must_use]
    pub fn new(
        resolver: LocaleResolver,
        registry: Arc<BundleRegistry>,
        options: ActivationOptions,
    ) -> Self {
        let snapshot = ActiveLocaleState {
            current_locale: resolver.fallback().clone(),
            load_status: LoadStatus::Unset,
        };
        Self {
            resolver,
            registry,
            options,
            state: Mutex::new(ControllerState {
                snapshot,
                bundle: None,
                last_error: None,
                latest_request: 0,
            }),
            notify: Mutex::new(()),
            observers: Arc::new(ObserverList::default()),
        }
    }

    /// Resolve `raw_preference` and make the result the active locale.
    ///
    /// Returns the state once this request's load settles. If a newer request
    /// started meanwhile, the returned snapshot reflects that request.
    pub async fn activate(&self, raw_preference: Option<&str>) -> ActiveLocaleState {
        let code = self.resolver.resolve(raw_preference);
        self.switch_to(code).await
    }

    /// Make `code` the active locale without alias resolution.
    ///
    /// `code` is taken as canonical; an unregistered code ends in
    /// [`LoadStatus::Error`].
    pub async fn set_locale(&self, code: LocaleCode) -> ActiveLocaleState {
        self.switch_to(code).await
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ActiveLocaleState {
        self.lock_state().snapshot.clone()
    }

    /// Bundle of the active locale once it has loaded.
    #[must_use]
    pub fn bundle(&self) -> Option<Arc<Bundle>> {
        self.lock_state().bundle.clone()
    }

    /// Most recent load failure, cleared by the next successful load.
    #[must_use]
    pub fn last_error(&self) -> Option<BundleError> {
        self.lock_state().last_error.clone()
    }

    /// The resolver used by [`Self::activate`].
    #[must_use]
    pub const fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Register `callback` to run after every state transition.
    ///
    /// Callbacks see transitions in the order they were applied and must not
    /// start an activation synchronously.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ActiveLocaleState) + Send + Sync + 'static,
    {
        self.observers.subscribe(Arc::new(callback))
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Render `key` from the active bundle, or the fallback bundle if the
    /// active one lacks it. Argument values are escaped.
    ///
    /// The fallback bundle is consulted only when it is already cached; this
    /// never triggers a load.
    #[must_use]
    pub fn translate(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        let active = self.bundle();
        let template_source = active
            .filter(|bundle| bundle.contains_key(key))
            .or_else(|| {
                self.registry
                    .cached(self.resolver.fallback())
                    .filter(|bundle| bundle.contains_key(key))
            })?;
        template_source
            .get(key)
            .map(|template| interpolate(template, args))
    }

    /// Like [`Self::translate`], returning `default` when no bundle has `key`.
    #[must_use]
    pub fn message(&self, key: &str, args: &[(&str, &str)], default: &str) -> String {
        self.translate(key, args)
            .unwrap_or_else(|| default.to_owned())
    }

    async fn switch_to(&self, code: LocaleCode) -> ActiveLocaleState {
        let Some(token) = self.begin(&code) else {
            debug!(locale = %code, "locale already active");
            return self.state();
        };
        let outcome = self.registry.load(&code).await;
        let failed = outcome.is_err();
        self.complete(token, &code, outcome);

        let fallback = self.resolver.fallback().clone();
        if failed && self.options.fallback_on_load_error && code != fallback {
            if !self.is_latest(token) {
                return self.state();
            }
            warn!(
                locale = %code,
                fallback = %fallback,
                "switching to fallback locale after load failure"
            );
            let Some(retry) = self.begin(&fallback) else {
                return self.state();
            };
            let outcome = self.registry.load(&fallback).await;
            self.complete(retry, &fallback, outcome);
        }
        self.state()
    }

    /// Enter `Loading` for `code` and return the request token, or `None`
    /// when `code` is already loaded and active.
    fn begin(&self, code: &LocaleCode) -> Option<u64> {
        let _order = self.lock_notify();
        let (token, snapshot) = {
            let mut state = self.lock_state();
            if state.snapshot.current_locale == *code
                && state.snapshot.load_status == LoadStatus::Loaded
            {
                return None;
            }
            state.latest_request = state.latest_request.wrapping_add(1);
            state.snapshot = ActiveLocaleState {
                current_locale: code.clone(),
                load_status: LoadStatus::Loading,
            };
            state.bundle = None;
            (state.latest_request, state.snapshot.clone())
        };
        debug!(locale = %code, token, "loading locale");
        self.observers.notify(&snapshot);
        Some(token)
    }

    fn complete(&self, token: u64, code: &LocaleCode, outcome: Result<Arc<Bundle>, BundleError>) {
        let _order = self.lock_notify();
        let snapshot = {
            let mut state = self.lock_state();
            if state.latest_request != token {
                debug!(locale = %code, token, "discarding stale locale load");
                return;
            }
            match outcome {
                Ok(bundle) => {
                    state.snapshot.load_status = LoadStatus::Loaded;
                    state.bundle = Some(bundle);
                    state.last_error = None;
                    info!(locale = %code, "locale active");
                }
                Err(err) => {
                    warn!(
                        requested = %code,
                        locale = %err.locale(),
                        error = %err,
                        "locale bundle failed to load"
                    );
                    state.snapshot.load_status = LoadStatus::Error;
                    state.last_error = Some(err);
                }
            }
            state.snapshot.clone()
        };
        self.observers.notify(&snapshot);
    }

    fn is_latest(&self, token: u64) -> bool {
        self.lock_state().latest_request == token
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_notify(&self) -> MutexGuard<'_, ()> {
        match self.notify.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
