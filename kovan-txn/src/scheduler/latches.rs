use crate::types::Key;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;

/// Key latches serializing commands that touch overlapping keys.
///
/// A command takes all of its latches at once or waits, so two commands can never hold part
/// of each other's key set.
#[derive(Debug, Default)]
pub struct Latches {
    held: Mutex<HashSet<Key>>,
    released: Condvar,
}

impl Latches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until none of `keys` is latched by another command, then latches all of them.
    pub fn acquire(&self, mut keys: Vec<Key>) -> LatchGuard<'_> {
        keys.sort();
        keys.dedup();

        let mut held = self.held.lock();
        while keys.iter().any(|key| held.contains(key)) {
            self.released.wait(&mut held);
        }
        held.extend(keys.iter().cloned());

        LatchGuard {
            latches: self,
            keys,
        }
    }

    /// Latches `keys` only if none of them is taken.
    pub fn try_acquire(&self, mut keys: Vec<Key>) -> Option<LatchGuard<'_>> {
        keys.sort();
        keys.dedup();

        let mut held = self.held.lock();
        if keys.iter().any(|key| held.contains(key)) {
            return None;
        }
        held.extend(keys.iter().cloned());

        Some(LatchGuard {
            latches: self,
            keys,
        })
    }

    fn release(&self, keys: &[Key]) {
        let mut held = self.held.lock();
        for key in keys {
            held.remove(key);
        }
        drop(held);
        self.released.notify_all();
    }
}

/// Releases its latches on drop.
#[derive(Debug)]
pub struct LatchGuard<'a> {
    latches: &'a Latches,
    keys: Vec<Key>,
}

impl LatchGuard<'_> {
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latches.release(&self.keys);
    }
}
