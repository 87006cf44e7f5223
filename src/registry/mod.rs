//! Lazy, deduplicated bundle loading keyed by locale code.
//!
//! Each locale maps to a loader closure producing a boxed future. The first
//! `load` for a locale starts that future and parks a shared handle in the
//! slot table; concurrent callers for the same locale await the same handle,
//! so the loader runs once. Success replaces the pending slot with the loaded
//! bundle for the rest of the process. Failure clears the slot so the next
//! `load` retries from scratch.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::bundle::Bundle;
use crate::error::BundleError;
use crate::locale_code::LocaleCode;

/// Future returned by a bundle loader.
pub type BundleFuture = BoxFuture<'static, Result<Bundle, BundleError>>;

/// Shared loader closure registered for a locale.
pub type BundleLoader = Arc<dyn Fn() -> BundleFuture + Send + Sync>;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<Bundle>, BundleError>>>;

#[derive(Clone)]
enum Slot {
    Ready(Arc<Bundle>),
    Pending { load_id: u64, load: SharedLoad },
}

#[derive(Default)]
struct RegistryState {
    loaders: BTreeMap<LocaleCode, BundleLoader>,
    slots: HashMap<LocaleCode, Slot>,
    next_load_id: u64,
}

/// Registry of lazily loaded translation bundles.
///
/// # Examples
///
/// ```rust
/// use futures::FutureExt;
/// use localekit::{Bundle, BundleRegistry, LocaleCode};
///
/// let registry = BundleRegistry::new();
/// let en = LocaleCode::new("en").expect("valid code");
/// let code = en.clone();
/// registry.register(en.clone(), move || {
///     let code = code.clone();
///     async move { Ok(Bundle::new(code, [("hello", "Hello")])) }.boxed()
/// });
///
/// let bundle = futures::executor::block_on(registry.load(&en)).expect("bundle loads");
/// assert_eq!(bundle.get("hello"), Some("Hello"));
/// assert!(registry.is_loaded(&en));
/// ```
#[derive(Default)]
pub struct BundleRegistry {
    state: Mutex<RegistryState>,
}

impl fmt::Debug for BundleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("BundleRegistry")
            .field("registered", &state.loaders.keys().collect::<Vec<_>>())
            .field("loaded", &loaded_codes(&state))
            .finish_non_exhaustive()
    }
}

impl BundleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `loader` for `code`, replacing any previous loader.
    ///
    /// A bundle that has already loaded, or a load already in flight, keeps
    /// its result; the new loader is used for loads that start afterwards.
    pub fn register<F>(&self, code: LocaleCode, loader: F)
    where
        F: Fn() -> BundleFuture + Send + Sync + 'static,
    {
        self.register_shared(code, Arc::new(loader));
    }

    /// Record an already shared loader for `code`.
    pub fn register_shared(&self, code: LocaleCode, loader: BundleLoader) {
        let mut state = self.lock_state();
        if state.loaders.insert(code.clone(), loader).is_some() {
            debug!(locale = %code, "replaced bundle loader");
        } else {
            debug!(locale = %code, "registered bundle loader");
        }
    }

    /// Register `region` with the loader currently registered for `base`.
    ///
    /// The region shares the base bundle's source but is cached under its
    /// own code.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::NotRegistered`] when `base` has no loader.
    pub fn register_alias(&self, region: LocaleCode, base: &LocaleCode) -> Result<(), BundleError> {
        let loader = self
            .loader(base)
            .ok_or_else(|| BundleError::NotRegistered {
                locale: base.clone(),
            })?;
        debug!(region = %region, base = %base, "registering region alias");
        self.register_shared(region, loader);
        Ok(())
    }

    /// Whether a loader is registered for `code`.
    #[must_use]
    pub fn is_registered(&self, code: &str) -> bool {
        self.lock_state().loaders.contains_key(code)
    }

    /// Whether the bundle for `code` has finished loading.
    #[must_use]
    pub fn is_loaded(&self, code: &LocaleCode) -> bool {
        matches!(self.lock_state().slots.get(code), Some(Slot::Ready(_)))
    }

    /// Loaded bundle for `code`, without triggering a load.
    #[must_use]
    pub fn cached(&self, code: &LocaleCode) -> Option<Arc<Bundle>> {
        match self.lock_state().slots.get(code) {
            Some(Slot::Ready(bundle)) => Some(Arc::clone(bundle)),
            _ => None,
        }
    }

    /// Registered locale codes in sorted order.
    #[must_use]
    pub fn registered_locales(&self) -> Vec<LocaleCode> {
        self.lock_state().loaders.keys().cloned().collect()
    }

    /// Load the bundle for `code`, reusing a cached or in-flight load.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::NotRegistered`] when no loader exists for
    /// `code`, or the loader's own error. Failures are not cached.
    pub fn load(
        &self,
        code: &LocaleCode,
    ) -> impl Future<Output = Result<Arc<Bundle>, BundleError>> + Send + '_ {
        let slot = self.begin_load(code);
        let code = code.clone();
        async move {
            let (load_id, load) = match slot? {
                Slot::Ready(bundle) => return Ok(bundle),
                Slot::Pending { load_id, load } => (load_id, load),
            };
            let result = load.await;
            self.finish_load(&code, load_id, &result);
            result
        }
    }

    fn loader(&self, code: &LocaleCode) -> Option<BundleLoader> {
        self.lock_state().loaders.get(code).cloned()
    }

    fn begin_load(&self, code: &LocaleCode) -> Result<Slot, BundleError> {
        let mut state = self.lock_state();
        if let Some(slot) = state.slots.get(code) {
            match slot {
                Slot::Ready(_) => debug!(locale = %code, "bundle cache hit"),
                Slot::Pending { .. } => debug!(locale = %code, "joining in-flight bundle load"),
            }
            return Ok(slot.clone());
        }
        let loader = state
            .loaders
            .get(code)
            .cloned()
            .ok_or_else(|| BundleError::NotRegistered {
                locale: code.clone(),
            })?;
        let load_id = state.next_load_id;
        state.next_load_id = state.next_load_id.wrapping_add(1);
        debug!(locale = %code, load_id, "starting bundle load");
        // The loader runs on first poll so user code never executes under the
        // registry lock.
        let load = async move { loader().await.map(Arc::new) }
            .boxed()
            .shared();
        let slot = Slot::Pending { load_id, load };
        state.slots.insert(code.clone(), slot.clone());
        Ok(slot)
    }

    fn finish_load(
        &self,
        code: &LocaleCode,
        load_id: u64,
        result: &Result<Arc<Bundle>, BundleError>,
    ) {
        let mut state = self.lock_state();
        let still_pending = matches!(
            state.slots.get(code),
            Some(Slot::Pending { load_id: pending, .. }) if *pending == load_id
        );
        if !still_pending {
            return;
        }
        match result {
            Ok(bundle) => {
                info!(locale = %code, messages = bundle.len(), "bundle loaded");
                state.slots.insert(code.clone(), Slot::Ready(Arc::clone(bundle)));
            }
            Err(err) => {
                warn!(locale = %code, error = %err, "bundle load failed");
                state.slots.remove(code);
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn loaded_codes(state: &RegistryState) -> Vec<&LocaleCode> {
    let mut codes: Vec<_> = state
        .slots
        .iter()
        .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
        .map(|(code, _)| code)
        .collect();
    codes.sort();
    codes
}
