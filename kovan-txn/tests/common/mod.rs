#![allow(dead_code)]

use kovan_txn::commands::{CommitResponse, PrewriteResponse, ResolveLockResponse, RollbackResponse};
use kovan_txn::{
    Commit, Error, Key, Lock, MemStorage, Modify, Mutation, Prewrite, RegionError, ResolveLock,
    RoTxn, Rollback, Scheduler, Snapshot, Storage, TimeStamp, Value, Write,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const TTL: u64 = 3000;

/// `MemStorage` that counts applied modifications, can fail reads of one key with a
/// region error and can refuse writes.
#[derive(Default)]
pub struct TestStorage {
    inner: MemStorage,
    applied: AtomicUsize,
    region_error_key: Mutex<Option<Key>>,
    fail_writes: AtomicBool,
}

impl TestStorage {
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    pub fn fail_reads_of(&self, key: Option<&[u8]>) {
        *self.region_error_key.lock() = key.map(|k| k.to_vec());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Storage for TestStorage {
    fn snapshot(&self) -> kovan_txn::Result<Arc<dyn Snapshot>> {
        Ok(Arc::new(TestSnapshot {
            inner: self.inner.snapshot()?,
            region_error_key: self.region_error_key.lock().clone(),
        }))
    }

    fn write(&self, batch: Vec<Modify>) -> kovan_txn::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected write failure".to_string()));
        }
        self.applied.fetch_add(batch.len(), Ordering::SeqCst);
        self.inner.write(batch)
    }
}

struct TestSnapshot {
    inner: Arc<dyn Snapshot>,
    region_error_key: Option<Key>,
}

impl TestSnapshot {
    fn check(&self, key: &[u8]) -> kovan_txn::Result<()> {
        match &self.region_error_key {
            Some(bad) if bad.as_slice() == key => {
                Err(Error::Region(RegionError::new("key not in region")))
            }
            _ => Ok(()),
        }
    }
}

impl Snapshot for TestSnapshot {
    fn get_lock(&self, key: &[u8]) -> kovan_txn::Result<Option<Lock>> {
        self.check(key)?;
        self.inner.get_lock(key)
    }

    fn scan_locks(&self) -> kovan_txn::Result<Vec<(Key, Lock)>> {
        self.inner.scan_locks()
    }

    fn seek_write(&self, key: &[u8], ts: TimeStamp) -> kovan_txn::Result<Option<(TimeStamp, Write)>> {
        self.check(key)?;
        self.inner.seek_write(key, ts)
    }

    fn get_value(&self, key: &[u8], start_ts: TimeStamp) -> kovan_txn::Result<Option<Value>> {
        self.check(key)?;
        self.inner.get_value(key, start_ts)
    }
}

pub struct TestEnv {
    pub storage: Arc<TestStorage>,
    pub scheduler: Scheduler,
}

impl TestEnv {
    pub fn new() -> Self {
        let storage = Arc::new(TestStorage::default());
        let scheduler = Scheduler::new(storage.clone());
        Self { storage, scheduler }
    }

    pub fn prewrite(&self, mutations: Vec<Mutation>, primary: &[u8], start_ts: TimeStamp) -> PrewriteResponse {
        self.scheduler
            .run(Prewrite::new(mutations, primary.to_vec(), start_ts, TTL))
            .unwrap()
    }

    pub fn must_prewrite_put(&self, key: &[u8], value: &[u8], primary: &[u8], start_ts: TimeStamp) {
        let resp = self.prewrite(vec![put(key, value)], primary, start_ts);
        assert!(resp.errors.is_empty(), "prewrite failed: {:?}", resp.errors);
    }

    pub fn must_prewrite_puts(&self, keys: &[&[u8]], start_ts: TimeStamp) {
        let mutations = keys.iter().map(|key| put(key, b"v")).collect();
        let resp = self.prewrite(mutations, keys[0], start_ts);
        assert!(resp.errors.is_empty(), "prewrite failed: {:?}", resp.errors);
    }

    pub fn commit(&self, keys: &[&[u8]], start_ts: TimeStamp, commit_ts: TimeStamp) -> CommitResponse {
        let keys = keys.iter().map(|key| key.to_vec()).collect();
        self.scheduler
            .run(Commit::new(keys, start_ts, commit_ts))
            .unwrap()
    }

    pub fn must_commit(&self, keys: &[&[u8]], start_ts: TimeStamp, commit_ts: TimeStamp) {
        let resp = self.commit(keys, start_ts, commit_ts);
        assert_eq!(resp, CommitResponse::default());
    }

    pub fn rollback(&self, keys: &[&[u8]], start_ts: TimeStamp) -> RollbackResponse {
        let keys = keys.iter().map(|key| key.to_vec()).collect();
        self.scheduler.run(Rollback::new(keys, start_ts)).unwrap()
    }

    pub fn resolve(&self, start_ts: TimeStamp, commit_version: TimeStamp) -> ResolveLockResponse {
        self.scheduler
            .run(ResolveLock::new(start_ts, commit_version))
            .unwrap()
    }

    pub fn lock(&self, key: &[u8]) -> Option<Lock> {
        let snapshot = self.storage.inner.snapshot().unwrap();
        snapshot.get_lock(key).unwrap()
    }

    pub fn locks(&self) -> Vec<(Key, Lock)> {
        let snapshot = self.storage.inner.snapshot().unwrap();
        snapshot.scan_locks().unwrap()
    }

    /// The write record `start_ts` left on `key`, with its commit timestamp.
    pub fn txn_write(&self, key: &[u8], start_ts: TimeStamp) -> Option<(Write, TimeStamp)> {
        let snapshot = self.storage.inner.snapshot().unwrap();
        RoTxn::new(snapshot.as_ref(), start_ts)
            .current_write(key)
            .unwrap()
    }

    pub fn value(&self, key: &[u8], start_ts: TimeStamp) -> Option<Value> {
        let snapshot = self.storage.inner.snapshot().unwrap();
        snapshot.get_value(key, start_ts).unwrap()
    }

    pub fn must_locked(&self, key: &[u8], start_ts: TimeStamp) -> Lock {
        let lock = self
            .lock(key)
            .unwrap_or_else(|| panic!("{} should be locked", key.escape_ascii()));
        assert_eq!(lock.ts, start_ts);
        lock
    }

    pub fn must_unlocked(&self, key: &[u8]) {
        assert!(
            self.lock(key).is_none(),
            "{} should not be locked",
            key.escape_ascii()
        );
    }

    pub fn must_rolled_back(&self, key: &[u8], start_ts: TimeStamp) {
        self.must_unlocked(key);
        let (write, commit_ts) = self
            .txn_write(key, start_ts)
            .unwrap_or_else(|| panic!("{} has no record of txn {}", key.escape_ascii(), start_ts));
        assert!(write.is_rollback(), "{:?}", write);
        assert_eq!(commit_ts, start_ts);
        assert!(self.value(key, start_ts).is_none());
    }

    pub fn must_committed(&self, key: &[u8], start_ts: TimeStamp, commit_ts: TimeStamp) {
        self.must_unlocked(key);
        let (write, ts) = self
            .txn_write(key, start_ts)
            .unwrap_or_else(|| panic!("{} has no record of txn {}", key.escape_ascii(), start_ts));
        assert!(!write.is_rollback(), "{:?}", write);
        assert_eq!(ts, commit_ts);
    }
}

pub fn put(key: &[u8], value: &[u8]) -> Mutation {
    Mutation::put(key.to_vec(), value.to_vec())
}

pub fn delete(key: &[u8]) -> Mutation {
    Mutation::delete(key.to_vec())
}
