//! Scoped mutation of the process environment for tests.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. [`ScopedEnv`] holds a global lock for its
//! whole lifetime, so only one test at a time can change variables, and
//! restores every touched variable when dropped.
//!
//! ```rust,ignore
//! use test_support::ScopedEnv;
//!
//! let env = ScopedEnv::lock()
//!     .set("LOCALEKIT_LOCALE", "de-AT")
//!     .remove("LOCALEKIT_FALLBACK_LOCALE");
//! // Both variables are restored when `env` is dropped.
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Lock on the process environment that restores changed variables on drop.
#[must_use = "dropping the guard restores the environment immediately"]
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl fmt::Debug for ScopedEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.saved.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ScopedEnv").field("saved", &names).finish()
    }
}

impl ScopedEnv {
    /// Acquire the environment lock, recovering it if a holder panicked.
    pub fn lock() -> Self {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    /// Set `name` to `value` until the guard is dropped.
    pub fn set(mut self, name: &str, value: impl AsRef<OsStr>) -> Self {
        self.remember(name);
        // SAFETY: the guard holds `ENV_LOCK`, serialising environment writes.
        unsafe { std::env::set_var(name, value) };
        self
    }

    /// Unset `name` until the guard is dropped.
    pub fn remove(mut self, name: &str) -> Self {
        self.remember(name);
        // SAFETY: the guard holds `ENV_LOCK`, serialising environment writes.
        unsafe { std::env::remove_var(name) };
        self
    }

    fn remember(&mut self, name: &str) {
        if self.saved.iter().all(|(saved, _)| saved != name) {
            self.saved.push((name.to_owned(), std::env::var_os(name)));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..).rev() {
            // SAFETY: `ENV_LOCK` is still held; it is released after this body.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(&name, value),
                    None => std::env::remove_var(&name),
                }
            }
        }
    }
}
