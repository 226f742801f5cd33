//! Single-key finalization: turn a transaction's lock into a committed write or a rollback
//! marker. Both are idempotent so any number of cleanups can race on the same key.

use crate::error::{KeyError, Result};
use crate::mvcc::{MvccTxn, Write};
use crate::types::TimeStamp;
use tracing::{debug, warn};

/// Commits `key` at `commit_ts` if the transaction still holds its lock.
///
/// Returns `false` when there is no lock of this transaction on the key. The key then has
/// already been committed or rolled back by someone else and nothing is queued.
pub fn commit_key(txn: &mut MvccTxn<'_>, key: &[u8], commit_ts: TimeStamp) -> Result<bool> {
    let start_ts = txn.start_ts();
    let lock = match txn.get_lock(key)? {
        Some(lock) if lock.is_owned_by(start_ts) => lock,
        _ => {
            debug!(start_ts, key = %key.escape_ascii(), "commit key: lock already resolved");
            return Ok(false);
        }
    };

    debug!(start_ts, commit_ts, key = %key.escape_ascii(), "commit key");
    txn.put_write(key.to_vec(), commit_ts, Write::new(start_ts, lock.kind));
    txn.delete_lock(key.to_vec());
    Ok(true)
}

/// Rolls back `key` for this transaction.
///
/// The rollback marker is written even when the lock is missing or belongs to someone else,
/// so a prewrite of this transaction arriving late can never lock the key again.
/// Rolling back a key this transaction already committed is reported as [`KeyError::Abort`].
pub fn rollback_key(txn: &mut MvccTxn<'_>, key: &[u8]) -> Result<Option<KeyError>> {
    let start_ts = txn.start_ts();

    if let Some((write, commit_ts)) = txn.current_write(key)? {
        if write.is_rollback() {
            debug!(start_ts, key = %key.escape_ascii(), "rollback key: already rolled back");
            return Ok(None);
        }
        warn!(
            start_ts,
            commit_ts,
            key = %key.escape_ascii(),
            "rollback key: transaction already committed"
        );
        return Ok(Some(KeyError::Abort(format!(
            "transaction {} already committed key '{}' at {}",
            start_ts,
            key.escape_ascii(),
            commit_ts
        ))));
    }

    debug!(start_ts, key = %key.escape_ascii(), "rollback key");
    if let Some(lock) = txn.get_lock(key)?
        && lock.is_owned_by(start_ts)
    {
        txn.delete_lock(key.to_vec());
        txn.delete_value(key.to_vec());
    }
    txn.put_write(key.to_vec(), start_ts, Write::rollback(start_ts));
    Ok(None)
}
