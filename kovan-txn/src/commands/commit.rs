use crate::commands::{Command, commit_key};
use crate::error::{Error, KeyError, RegionError, Result};
use crate::mvcc::MvccTxn;
use crate::types::{Key, TimeStamp};
use tracing::warn;

/// Second phase of 2PC: commit the given keys of a prewritten transaction.
///
/// Clients commit the primary key on its own first; once that succeeds the transaction is
/// committed and the secondaries may follow in any order.
#[derive(Debug, Clone)]
pub struct Commit {
    keys: Vec<Key>,
    start_ts: TimeStamp,
    commit_ts: TimeStamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResponse {
    pub error: Option<KeyError>,
    pub region_error: Option<RegionError>,
}

impl Commit {
    pub fn new(keys: Vec<Key>, start_ts: TimeStamp, commit_ts: TimeStamp) -> Self {
        Self {
            keys,
            start_ts,
            commit_ts,
        }
    }

    pub fn commit_ts(&self) -> TimeStamp {
        self.commit_ts
    }

    fn commit(&self, txn: &mut MvccTxn<'_>, key: &[u8]) -> Result<Option<KeyError>> {
        if commit_key(txn, key, self.commit_ts)? {
            return Ok(None);
        }

        // No lock of ours: find out what happened to the key.
        match txn.current_write(key)? {
            Some((write, _)) if write.is_rollback() => {
                warn!(
                    start_ts = self.start_ts,
                    key = %key.escape_ascii(),
                    "commit after rollback"
                );
                Ok(Some(KeyError::Abort(format!(
                    "transaction {} has been rolled back",
                    self.start_ts
                ))))
            }
            // Already committed, the request is a retry.
            Some(_) => Ok(None),
            None => Ok(Some(KeyError::Retryable(format!(
                "lock not found for key '{}'",
                key.escape_ascii()
            )))),
        }
    }
}

impl Command for Commit {
    type Response = CommitResponse;

    fn start_ts(&self) -> TimeStamp {
        self.start_ts
    }

    fn will_write(&self) -> Vec<Key> {
        self.keys.clone()
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<CommitResponse> {
        if self.commit_ts <= self.start_ts {
            return Err(Error::InvalidCommitTs {
                start_ts: self.start_ts,
                commit_ts: self.commit_ts,
            });
        }

        let mut response = CommitResponse::default();
        for key in &self.keys {
            match self.commit(txn, key) {
                Ok(None) => {}
                Ok(Some(key_error)) => {
                    response.error = Some(key_error);
                    break;
                }
                Err(Error::Region(region_error)) => {
                    response.region_error = Some(region_error);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(response)
    }
}
