use crate::commands::Command;
use crate::error::{Error, KeyError, Result, WriteConflict};
use crate::mvcc::{Lock, MvccTxn, WriteKind};
use crate::types::{Key, Mutation, Op, TimeStamp};
use tracing::debug;

/// First phase of 2PC: lock every key of the transaction and stage its values.
///
/// Each mutation is checked on its own. A key that is locked by another transaction or that
/// was written at or after our start timestamp is reported in the response and left alone;
/// the remaining keys are still locked. The client aborts the transaction if any error is
/// reported.
#[derive(Debug, Clone)]
pub struct Prewrite {
    mutations: Vec<Mutation>,
    primary: Key,
    start_ts: TimeStamp,
    lock_ttl: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrewriteResponse {
    pub errors: Vec<KeyError>,
}

impl Prewrite {
    pub fn new(mutations: Vec<Mutation>, primary: Key, start_ts: TimeStamp, lock_ttl: u64) -> Self {
        Self {
            mutations,
            primary,
            start_ts,
            lock_ttl,
        }
    }

    pub fn primary(&self) -> &[u8] {
        &self.primary
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Prewrites one mutation. `Ok(Some(_))` means the key was skipped because of a conflict;
    /// `Err` is reserved for failures that abort the whole command.
    fn prewrite_mutation(&self, txn: &mut MvccTxn<'_>, mutation: &Mutation) -> Result<Option<KeyError>> {
        let key = &mutation.key;
        let start_ts = txn.start_ts();
        debug!(start_ts, key = %key.escape_ascii(), "prewrite key");

        let kind = match mutation.op {
            Op::Put => WriteKind::Put,
            Op::Del => WriteKind::Delete,
            op => return Err(Error::UnexpectedOp(op)),
        };

        // A lock with our own start ts means this request is a retry; prewrite again.
        if let Some(lock) = txn.get_lock(key)?
            && !lock.is_owned_by(start_ts)
        {
            debug!(start_ts, lock_ts = lock.ts, key = %key.escape_ascii(), "key is locked");
            return Ok(Some(KeyError::Locked(lock.info(key))));
        }

        if let Some((write, commit_ts)) = txn.most_recent_write(key)?
            && commit_ts >= start_ts
        {
            debug!(
                start_ts,
                conflict_ts = write.start_ts,
                conflict_commit_ts = commit_ts,
                key = %key.escape_ascii(),
                "write conflict"
            );
            return Ok(Some(KeyError::Conflict(WriteConflict {
                start_ts,
                conflict_ts: write.start_ts,
                conflict_commit_ts: commit_ts,
                key: key.clone(),
                primary: self.primary.clone(),
            })));
        }

        txn.put_lock(
            key.clone(),
            Lock::new(start_ts, self.primary.clone(), self.lock_ttl, kind),
        );
        match kind {
            WriteKind::Put => txn.put_value(key.clone(), mutation.value.clone()),
            _ => txn.delete_value(key.clone()),
        }
        Ok(None)
    }
}

impl Command for Prewrite {
    type Response = PrewriteResponse;

    fn start_ts(&self) -> TimeStamp {
        self.start_ts
    }

    fn will_write(&self) -> Vec<Key> {
        self.mutations.iter().map(|m| m.key.clone()).collect()
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<PrewriteResponse> {
        let mut response = PrewriteResponse::default();
        for mutation in &self.mutations {
            if let Some(key_error) = self.prewrite_mutation(txn, mutation)? {
                response.errors.push(key_error);
            }
        }
        Ok(response)
    }
}
