//! Interface to the versioned store.
//!
//! The store keeps three columns, the same split TiKV uses: locks (CF_LOCK), the write
//! history (CF_WRITE) and the data (CF_DEFAULT). Commands only ever read from a [`Snapshot`]
//! and hand their changes back as a batch of [`Modify`] entries, which the store applies
//! atomically in [`Storage::write`].

mod memory;

pub use memory::MemStorage;

use crate::error::Result;
use crate::mvcc::{Lock, Write};
use crate::types::{Key, TimeStamp, Value};
use std::sync::Arc;

/// A consistent, read-only view of the store.
pub trait Snapshot: Send + Sync {
    fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>>;

    /// Every lock in the store, ordered by key.
    fn scan_locks(&self) -> Result<Vec<(Key, Lock)>>;

    /// The newest write record of `key` with a commit timestamp `<= ts`.
    fn seek_write(&self, key: &[u8], ts: TimeStamp) -> Result<Option<(TimeStamp, Write)>>;

    /// The value written by the transaction that started at `start_ts`.
    fn get_value(&self, key: &[u8], start_ts: TimeStamp) -> Result<Option<Value>>;
}

/// A single queued change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modify {
    PutLock(Key, Lock),
    DeleteLock(Key),
    PutWrite(Key, TimeStamp, Write),
    PutValue(Key, TimeStamp, Value),
    DeleteValue(Key, TimeStamp),
}

impl Modify {
    pub fn key(&self) -> &[u8] {
        match self {
            Modify::PutLock(key, _)
            | Modify::DeleteLock(key)
            | Modify::PutWrite(key, _, _)
            | Modify::PutValue(key, _, _)
            | Modify::DeleteValue(key, _) => key,
        }
    }
}

pub trait Storage: Send + Sync {
    fn snapshot(&self) -> Result<Arc<dyn Snapshot>>;

    /// Applies the whole batch or nothing.
    ///
    /// Write records are keyed by `(key, commit_ts)` and rollback markers by
    /// `(key, start_ts)`, so timestamps handed out by the oracle must be unique: a record at an
    /// already used timestamp replaces the old one.
    fn write(&self, batch: Vec<Modify>) -> Result<()>;
}
