//! Per-session write locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::SessionKey;

/// Hands out one mutex per session key.
///
/// Writers hold the key's mutex across load, mutate and persist. Different
/// keys never wait on each other beyond the map lookup.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    locks: Arc<Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>>,
}

impl KeyLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex guarding `key`, creating it on first use.
    pub fn handle(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drops the entry for `key` unless someone still holds its handle.
    pub fn release(&self, key: &SessionKey) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(key).is_some_and(|handle| Arc::strong_count(handle) == 1) {
            locks.remove(key);
            trace!(%key, "Session lock released");
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true before any key was locked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locks a handle from [`KeyLocks::handle`]. The guarded value is `()`, so a
/// poisoned lock carries no broken state and is simply taken over.
pub fn acquire(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    trace!("Waiting for session lock");
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_rules::GameKind;

    #[test]
    fn test_same_key_same_mutex() {
        let locks = KeyLocks::new();
        let key = SessionKey::pair(GameKind::Reversi, "a", "b");
        let first = locks.handle(&key);
        let second = locks.handle(&SessionKey::pair(GameKind::Reversi, "b", "a"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let one = locks.handle(&SessionKey::solo(GameKind::Lines, "a"));
        let two = locks.handle(&SessionKey::solo(GameKind::Lines, "b"));
        let _held = acquire(&one);
        assert!(two.try_lock().is_ok());
    }

    #[test]
    fn test_release_skips_held_handles() {
        let locks = KeyLocks::new();
        let idle = SessionKey::solo(GameKind::Sudoku, "a");
        let busy = SessionKey::solo(GameKind::Sudoku, "b");
        drop(locks.handle(&idle));
        let held = locks.handle(&busy);

        locks.release(&idle);
        locks.release(&busy);
        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&held, &locks.handle(&busy)));

        drop(held);
        locks.release(&busy);
        assert!(locks.is_empty());
    }
}
