use crate::commands::{Command, ReadOutcome, commit_key, rollback_key};
use crate::error::{Error, KeyError, RegionError, Result};
use crate::mvcc::{Lock, MvccTxn, RoTxn, WriteKind};
use crate::types::{Key, TimeStamp};
use tracing::{debug, info, warn};

/// Finishes a transaction from the locks it left behind.
///
/// Issued by the client that started the transaction, by another transaction blocked on one
/// of its locks, or by lock cleanup once a TTL expired. `commit_version == 0` asks for
/// rollback, anything else for a commit at that timestamp. Secondaries always follow the
/// primary: a key is only committed if the primary carries a committed write of this
/// transaction at `commit_version`, whatever was requested. A primary that was never
/// finalized is rolled back together with the secondaries.
#[derive(Debug, Clone)]
pub struct ResolveLock {
    start_ts: TimeStamp,
    commit_version: TimeStamp,
    /// Filled by the read phase.
    key_locks: Vec<(Key, Lock)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveLockResponse {
    pub error: Option<KeyError>,
    pub region_error: Option<RegionError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Commit(TimeStamp),
    Rollback,
    /// The primary was never finalized. It is rolled back too, so a late prewrite of it
    /// can not revive the transaction.
    RollbackWithPrimary,
    /// The primary committed at this timestamp, but a rollback or another commit version was
    /// requested.
    Conflicting(TimeStamp),
}

impl ResolveLock {
    pub fn new(start_ts: TimeStamp, commit_version: TimeStamp) -> Self {
        Self {
            start_ts,
            commit_version,
            key_locks: Vec::new(),
        }
    }

    pub fn commit_version(&self) -> TimeStamp {
        self.commit_version
    }

    fn check_commit_version(&self) -> Result<()> {
        if self.commit_version != 0 && self.commit_version <= self.start_ts {
            return Err(Error::InvalidCommitTs {
                start_ts: self.start_ts,
                commit_ts: self.commit_version,
            });
        }
        Ok(())
    }

    /// Decides the fate of one key from the state of its transaction's primary.
    fn resolution(&self, txn: &MvccTxn<'_>, lock: &Lock) -> Result<Resolution> {
        if lock.kind == WriteKind::Rollback {
            return Ok(Resolution::Rollback);
        }
        match txn.current_write(&lock.primary)? {
            Some((write, _)) if write.is_rollback() => Ok(Resolution::Rollback),
            None => Ok(Resolution::RollbackWithPrimary),
            Some((_, primary_commit_ts)) if primary_commit_ts == self.commit_version => {
                Ok(Resolution::Commit(primary_commit_ts))
            }
            Some((_, primary_commit_ts)) => Ok(Resolution::Conflicting(primary_commit_ts)),
        }
    }

    fn is_discovered(&self, key: &[u8]) -> bool {
        self.key_locks.iter().any(|(k, _)| k.as_slice() == key)
    }

    /// Resolves one key. `finalized` collects the undiscovered primaries already rolled back
    /// by this command.
    fn resolve_key(
        &self,
        txn: &mut MvccTxn<'_>,
        key: &[u8],
        lock: &Lock,
        finalized: &mut Vec<Key>,
    ) -> Result<Option<KeyError>> {
        let resolution = self.resolution(txn, lock)?;
        debug!(start_ts = self.start_ts, key = %key.escape_ascii(), ?resolution, "resolve key");
        match resolution {
            Resolution::Rollback => rollback_key(txn, key),
            Resolution::RollbackWithPrimary => {
                let primary = &lock.primary;
                if !self.is_discovered(primary) && !finalized.contains(primary) {
                    debug!(
                        start_ts = self.start_ts,
                        primary = %primary.escape_ascii(),
                        "rolling back unfinalized primary"
                    );
                    if let Some(key_error) = rollback_key(txn, primary)? {
                        return Ok(Some(key_error));
                    }
                    finalized.push(primary.clone());
                }
                rollback_key(txn, key)
            }
            Resolution::Commit(commit_ts) => {
                commit_key(txn, key, commit_ts)?;
                Ok(None)
            }
            Resolution::Conflicting(primary_commit_ts) => {
                warn!(
                    start_ts = self.start_ts,
                    primary_commit_ts,
                    commit_version = self.commit_version,
                    key = %key.escape_ascii(),
                    "resolve does not match the committed primary"
                );
                Ok(Some(KeyError::Abort(format!(
                    "transaction {} is committed at {}, refusing to resolve key '{}' with commit version {}",
                    self.start_ts,
                    primary_commit_ts,
                    key.escape_ascii(),
                    self.commit_version
                ))))
            }
        }
    }
}

impl Command for ResolveLock {
    type Response = ResolveLockResponse;

    fn start_ts(&self) -> TimeStamp {
        self.start_ts
    }

    fn will_write(&self) -> Vec<Key> {
        Vec::new()
    }

    fn read(&mut self, txn: &RoTxn<'_>) -> Result<ReadOutcome<ResolveLockResponse>> {
        self.check_commit_version()?;
        self.key_locks = txn.all_locks_for_txn()?;
        if self.key_locks.is_empty() {
            debug!(start_ts = self.start_ts, "no locks to resolve");
            return Ok(ReadOutcome::respond(ResolveLockResponse::default()));
        }
        // The primary may have to be rolled back even when it holds no lock of ours
        let keys = self
            .key_locks
            .iter()
            .flat_map(|(key, lock)| [key.clone(), lock.primary.clone()])
            .collect();
        Ok(ReadOutcome::latch(keys))
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<ResolveLockResponse> {
        self.check_commit_version()?;
        info!(
            lock_ts = self.start_ts,
            number = self.key_locks.len(),
            commit_ts = self.commit_version,
            "resolving locks"
        );

        let mut response = ResolveLockResponse::default();
        let mut finalized = Vec::new();
        for (key, lock) in &self.key_locks {
            match self.resolve_key(txn, key, lock, &mut finalized) {
                Ok(None) => {}
                Ok(Some(key_error)) => {
                    response.error.get_or_insert(key_error);
                }
                Err(Error::Region(region_error)) => {
                    response.region_error.get_or_insert(region_error);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(response)
    }
}
