use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::OwnedMutexGuard;

/// Async mutexes keyed by string, used to serialize work per channel address.
///
/// Every caller of [`KeyedLocks::lock`] is counted from the moment it starts
/// waiting until its guard (or its cancelled future) is dropped. An entry is
/// removed when that count reaches zero, so the map only grows with the
/// number of concurrently active keys.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Slot>>,
}

struct Slot {
    mutex: Arc<tokio::sync::Mutex<()>>,
    users: usize,
}

pub(crate) struct KeyedLockGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn lock(&self, key: &str) -> KeyedLockGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            let slot = locks.entry(key.to_string()).or_insert_with(|| Slot {
                mutex: Arc::new(tokio::sync::Mutex::new(())),
                users: 0,
            });
            slot.users += 1;
            slot.mutex.clone()
        };
        // Built before waiting so a cancelled waiter still deregisters.
        let mut guard = KeyedLockGuard {
            owner: self,
            key: key.to_string(),
            guard: None,
        };
        guard.guard = Some(mutex.lock_owned().await);
        guard
    }

    #[cfg(test)]
    pub(crate) fn active_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.owner.locks.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}
