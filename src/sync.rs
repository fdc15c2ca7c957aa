//! Synchronized state abstraction for behavior state shared across threads.
//!
//! A behavior instance is mutated by the tick driver, the state feeds and
//! orchestrator requests. All of them go through one [`SharedState`] so each
//! access sees a whole record (no torn pose/velocity/distance reads).

use std::sync::{Arc, Mutex, MutexGuard};

/// Platform-agnostic synchronized state access.
///
/// # Example
///
/// ```
/// use aerial_behaviors::sync::{MutexState, SharedState};
///
/// let state = MutexState::new(42u32);
/// state.with_mut(|v| *v += 1);
/// assert_eq!(state.with(|v| *v), 43);
/// ```
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// Mutex-backed shared state, cheap to clone
///
/// A panic while the lock is held poisons the mutex; later accesses recover
/// the inner value and log a warning instead of propagating the panic.
pub struct MutexState<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> MutexState<T> {
    /// Creates a new `MutexState` wrapping the given value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("Shared state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<T> Clone for MutexState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedState<T> for MutexState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.lock())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.lock())
    }
}
