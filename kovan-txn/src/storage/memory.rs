use crate::error::Result;
use crate::mvcc::{Lock, Write};
use crate::storage::{Modify, Snapshot, Storage};
use crate::types::{Key, TimeStamp, Value};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Versioned column key: newest version of a key sorts first.
type VersionedKey = (Key, Reverse<TimeStamp>);

#[derive(Debug, Default, Clone)]
struct Columns {
    locks: BTreeMap<Key, Lock>,
    writes: BTreeMap<VersionedKey, Write>,
    values: BTreeMap<VersionedKey, Value>,
}

impl Columns {
    fn apply(&mut self, modify: Modify) {
        match modify {
            Modify::PutLock(key, lock) => {
                self.locks.insert(key, lock);
            }
            Modify::DeleteLock(key) => {
                self.locks.remove(&key);
            }
            Modify::PutWrite(key, commit_ts, write) => {
                let replaced = self.writes.insert((key, Reverse(commit_ts)), write);
                debug_assert!(
                    replaced.is_none_or(|old| old == write),
                    "write record at ts {} overwritten: {:?} -> {:?}",
                    commit_ts,
                    replaced,
                    write
                );
            }
            Modify::PutValue(key, start_ts, value) => {
                self.values.insert((key, Reverse(start_ts)), value);
            }
            Modify::DeleteValue(key, start_ts) => {
                self.values.remove(&(key, Reverse(start_ts)));
            }
        }
    }
}

/// In-memory store.
///
/// Columns are shared copy-on-write: a snapshot is an `Arc` clone of the current columns and
/// a write batch is applied to a private copy when snapshots are still alive, so readers never
/// observe a half-applied batch.
#[derive(Debug, Default)]
pub struct MemStorage {
    columns: RwLock<Arc<Columns>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemStorage {
    fn snapshot(&self) -> Result<Arc<dyn Snapshot>> {
        let columns = self.columns.read().clone();
        Ok(Arc::new(MemSnapshot { columns }))
    }

    fn write(&self, batch: Vec<Modify>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut guard = self.columns.write();
        let columns = Arc::make_mut(&mut guard);
        for modify in batch {
            columns.apply(modify);
        }
        Ok(())
    }
}

struct MemSnapshot {
    columns: Arc<Columns>,
}

impl Snapshot for MemSnapshot {
    fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>> {
        Ok(self.columns.locks.get(key).cloned())
    }

    fn scan_locks(&self) -> Result<Vec<(Key, Lock)>> {
        Ok(self
            .columns
            .locks
            .iter()
            .map(|(key, lock)| (key.clone(), lock.clone()))
            .collect())
    }

    fn seek_write(&self, key: &[u8], ts: TimeStamp) -> Result<Option<(TimeStamp, Write)>> {
        let found = self
            .columns
            .writes
            .range((key.to_vec(), Reverse(ts))..)
            .next()
            .filter(|((k, _), _)| k.as_slice() == key)
            .map(|((_, Reverse(commit_ts)), write)| (*commit_ts, *write));
        Ok(found)
    }

    fn get_value(&self, key: &[u8], start_ts: TimeStamp) -> Result<Option<Value>> {
        Ok(self
            .columns
            .values
            .get(&(key.to_vec(), Reverse(start_ts)))
            .cloned())
    }
}
