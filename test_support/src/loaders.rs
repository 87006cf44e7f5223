//! Instrumented bundle loaders.
//!
//! [`CountingLoader`] records how often the registry invokes it and can be
//! told to fail its first few invocations. [`GatedLoader`] additionally
//! holds every load open until [`GatedLoader::open`] is called, which lets
//! tests overlap concurrent requests deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::Shared;
use localekit::registry::BundleFuture;
use localekit::{Bundle, BundleError, LocaleCode};

/// Loader that counts invocations and optionally fails the first ones.
#[derive(Debug, Clone)]
pub struct CountingLoader {
    locale: LocaleCode,
    messages: Arc<Vec<(String, String)>>,
    calls: Arc<AtomicUsize>,
    failures: usize,
}

impl CountingLoader {
    /// Loader producing a bundle for `locale` with `messages`.
    pub fn new(locale: LocaleCode, messages: &[(&str, &str)]) -> Self {
        Self {
            locale,
            messages: Arc::new(
                messages
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
            failures: 0,
        }
    }

    /// Fail the first `failures` invocations with [`BundleError::Loader`].
    #[must_use]
    pub const fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Number of times the loader has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Build the loader closure to pass to `BundleRegistry::register`.
    pub fn loader(&self) -> impl Fn() -> BundleFuture + Send + Sync + 'static {
        let this = self.clone();
        move || this.invoke().boxed()
    }

    fn invoke(&self) -> impl Future<Output = Result<Bundle, BundleError>> + Send + 'static {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = if attempt < self.failures {
            Err(BundleError::Loader {
                locale: self.locale.clone(),
                message: format!("simulated failure {}", attempt + 1),
            })
        } else {
            Ok(Bundle::new(
                self.locale.clone(),
                self.messages
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            ))
        };
        futures::future::ready(outcome)
    }
}

/// Loader whose loads stay pending until the gate is opened.
pub struct GatedLoader {
    inner: CountingLoader,
    release: Mutex<Option<oneshot::Sender<()>>>,
    signal: Shared<oneshot::Receiver<()>>,
}

impl std::fmt::Debug for GatedLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatedLoader")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl GatedLoader {
    /// Gate a [`CountingLoader`].
    pub fn new(inner: CountingLoader) -> Self {
        let (release, signal) = oneshot::channel();
        Self {
            inner,
            release: Mutex::new(Some(release)),
            signal: signal.shared(),
        }
    }

    /// Let every pending and future load complete.
    pub fn open(&self) {
        let sender = self
            .release
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(sender) = sender {
            drop(sender.send(()));
        }
    }

    /// Number of times the loader has been invoked.
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }

    /// Build the loader closure to pass to `BundleRegistry::register`.
    pub fn loader(&self) -> impl Fn() -> BundleFuture + Send + Sync + 'static {
        let inner = self.inner.clone();
        let signal = self.signal.clone();
        move || {
            let load = inner.invoke();
            let gate = signal.clone();
            async move {
                drop(gate.await);
                load.await
            }
            .boxed()
        }
    }
}
