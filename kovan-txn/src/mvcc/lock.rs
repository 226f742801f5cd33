use crate::mvcc::WriteKind;
use crate::types::{Key, TimeStamp};

/// Lock stored in the lock column, one per key at most.
/// The owner is identified by `ts`, the transaction's start timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub ts: TimeStamp,
    pub primary: Key,
    pub ttl: u64,
    pub kind: WriteKind,
}

/// What a blocked client is told about the lock in its way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub primary_lock: Key,
    pub lock_version: TimeStamp,
    pub key: Key,
    pub lock_ttl: u64,
}

impl Lock {
    pub fn new(ts: TimeStamp, primary: Key, ttl: u64, kind: WriteKind) -> Self {
        Self {
            ts,
            primary,
            ttl,
            kind,
        }
    }

    pub fn info(&self, key: &[u8]) -> LockInfo {
        LockInfo {
            primary_lock: self.primary.clone(),
            lock_version: self.ts,
            key: key.to_vec(),
            lock_ttl: self.ttl,
        }
    }

    pub fn is_owned_by(&self, start_ts: TimeStamp) -> bool {
        self.ts == start_ts
    }
}
