use crate::error::Result;
use crate::mvcc::{Lock, Write};
use crate::storage::{Modify, Snapshot};
use crate::types::{Key, TimeStamp, Value};

/// Read-only view of the store on behalf of the transaction that started at `start_ts`.
pub struct RoTxn<'a> {
    snapshot: &'a dyn Snapshot,
    start_ts: TimeStamp,
}

impl<'a> RoTxn<'a> {
    pub fn new(snapshot: &'a dyn Snapshot, start_ts: TimeStamp) -> Self {
        Self { snapshot, start_ts }
    }

    pub fn start_ts(&self) -> TimeStamp {
        self.start_ts
    }

    pub fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>> {
        self.snapshot.get_lock(key)
    }

    /// Finds the write record this transaction left on `key`, if any, with its commit
    /// timestamp.
    ///
    /// Commit timestamps are always at least the start timestamp (rollback markers use the
    /// start timestamp itself), so the walk stops as soon as the history drops below it.
    pub fn current_write(&self, key: &[u8]) -> Result<Option<(Write, TimeStamp)>> {
        let mut seek_ts = TimeStamp::MAX;
        while let Some((commit_ts, write)) = self.snapshot.seek_write(key, seek_ts)? {
            if commit_ts < self.start_ts {
                break;
            }
            if write.start_ts == self.start_ts {
                return Ok(Some((write, commit_ts)));
            }
            if commit_ts == 0 {
                break;
            }
            seek_ts = commit_ts - 1;
        }
        Ok(None)
    }

    /// The newest write record of `key`, whoever wrote it.
    pub fn most_recent_write(&self, key: &[u8]) -> Result<Option<(Write, TimeStamp)>> {
        Ok(self
            .snapshot
            .seek_write(key, TimeStamp::MAX)?
            .map(|(commit_ts, write)| (write, commit_ts)))
    }

    pub fn get_value(&self, key: &[u8]) -> Result<Option<Value>> {
        self.snapshot.get_value(key, self.start_ts)
    }

    /// Every key still locked by this transaction, in key order.
    ///
    /// Nothing records which keys a transaction wrote, so this scan is the only way to find
    /// the secondaries of a transaction whose client went away.
    pub fn all_locks_for_txn(&self) -> Result<Vec<(Key, Lock)>> {
        let mut locks = self.snapshot.scan_locks()?;
        locks.retain(|(_, lock)| lock.is_owned_by(self.start_ts));
        Ok(locks)
    }
}

/// A transaction context for one command: reads from a snapshot and queues writes.
///
/// Queued writes are not visible to reads made through the same context; they are handed to
/// the store in one batch by [`MvccTxn::into_modifies`].
pub struct MvccTxn<'a> {
    reader: RoTxn<'a>,
    modifies: Vec<Modify>,
}

impl<'a> MvccTxn<'a> {
    pub fn new(snapshot: &'a dyn Snapshot, start_ts: TimeStamp) -> Self {
        Self {
            reader: RoTxn::new(snapshot, start_ts),
            modifies: Vec::new(),
        }
    }

    pub fn start_ts(&self) -> TimeStamp {
        self.reader.start_ts()
    }

    pub fn reader(&self) -> &RoTxn<'a> {
        &self.reader
    }

    pub fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>> {
        self.reader.get_lock(key)
    }

    pub fn current_write(&self, key: &[u8]) -> Result<Option<(Write, TimeStamp)>> {
        self.reader.current_write(key)
    }

    pub fn most_recent_write(&self, key: &[u8]) -> Result<Option<(Write, TimeStamp)>> {
        self.reader.most_recent_write(key)
    }

    pub fn all_locks_for_txn(&self) -> Result<Vec<(Key, Lock)>> {
        self.reader.all_locks_for_txn()
    }

    pub fn put_lock(&mut self, key: Key, lock: Lock) {
        self.modifies.push(Modify::PutLock(key, lock));
    }

    pub fn delete_lock(&mut self, key: Key) {
        self.modifies.push(Modify::DeleteLock(key));
    }

    pub fn put_write(&mut self, key: Key, commit_ts: TimeStamp, write: Write) {
        self.modifies.push(Modify::PutWrite(key, commit_ts, write));
    }

    pub fn put_value(&mut self, key: Key, value: Value) {
        let start_ts = self.start_ts();
        self.modifies.push(Modify::PutValue(key, start_ts, value));
    }

    pub fn delete_value(&mut self, key: Key) {
        let start_ts = self.start_ts();
        self.modifies.push(Modify::DeleteValue(key, start_ts));
    }

    pub fn modifies(&self) -> &[Modify] {
        &self.modifies
    }

    pub fn into_modifies(self) -> Vec<Modify> {
        self.modifies
    }
}
