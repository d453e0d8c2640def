//! Scoped screen wake lock.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::WakeLock;

/// Holds a [`WakeLock`] for the lifetime of a navigation session.
///
/// The lock is released exactly once: by [`WakeLockGuard::release`] or,
/// failing that, on drop.
pub struct WakeLockGuard {
    lock: Arc<dyn WakeLock>,
    held: bool,
}

impl std::fmt::Debug for WakeLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockGuard")
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}

impl WakeLockGuard {
    /// Acquire `lock`.
    ///
    /// A refused acquisition is logged and yields a guard that holds nothing;
    /// navigation works without a wake lock.
    #[must_use]
    pub fn acquire(lock: Arc<dyn WakeLock>, keep_screen_on: bool) -> Self {
        let held = match lock.acquire(keep_screen_on) {
            Ok(()) => {
                debug!(keep_screen_on, "Wake lock acquired");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not acquire wake lock");
                false
            }
        };
        Self { lock, held }
    }

    /// Whether the lock is currently held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Release the lock now.
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Give up the guard without releasing the platform lock.
    ///
    /// Used when another session has taken over the same lock.
    pub fn forget(mut self) {
        if std::mem::take(&mut self.held) {
            debug!("Wake lock handed over");
        }
    }

    fn release_inner(&mut self) {
        if std::mem::take(&mut self.held) {
            self.lock.release();
            debug!("Wake lock released");
        }
    }
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::services::WakeLockError;

    #[derive(Debug, Default)]
    struct CountingLock {
        acquired: AtomicUsize,
        released: AtomicUsize,
        refuse: bool,
    }

    impl WakeLock for CountingLock {
        fn acquire(&self, _keep_screen_on: bool) -> Result<(), WakeLockError> {
            if self.refuse {
                return Err(WakeLockError::Denied("test".to_string()));
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_explicit_release_happens_once() {
        let lock = Arc::new(CountingLock::default());
        let guard = WakeLockGuard::acquire(lock.clone(), true);
        assert!(guard.is_held());

        guard.release();
        assert_eq!(lock.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(lock.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let lock = Arc::new(CountingLock::default());
        {
            let _guard = WakeLockGuard::acquire(lock.clone(), false);
        }
        assert_eq!(lock.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refused_lock_is_never_released() {
        let lock = Arc::new(CountingLock {
            refuse: true,
            ..CountingLock::default()
        });
        let guard = WakeLockGuard::acquire(lock.clone(), true);
        assert!(!guard.is_held());
        drop(guard);
        assert_eq!(lock.released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_forget_leaves_lock_on() {
        let lock = Arc::new(CountingLock::default());
        let guard = WakeLockGuard::acquire(lock.clone(), true);
        guard.forget();
        assert_eq!(lock.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(lock.released.load(Ordering::SeqCst), 0);
    }
}
