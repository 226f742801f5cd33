use crate::mvcc::LockInfo;
use crate::types::{Key, Op, TimeStamp};
use thiserror::Error;

/// Fatal errors. Any of these aborts the whole command: nothing it queued is applied.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),
    /// Prewrite only understands puts and deletes
    #[error("Unexpected mutation op {0:?} in prewrite")]
    UnexpectedOp(Op),
    /// A commit timestamp must be strictly newer than the transaction's start
    #[error("Invalid commit ts {commit_ts} for transaction started at {start_ts}")]
    InvalidCommitTs {
        start_ts: TimeStamp,
        commit_ts: TimeStamp,
    },
    #[error("Key is too large: {size} bytes, limit is {limit}")]
    KeyTooLarge { size: usize, limit: usize },
    /// Routing-layer error surfaced by the store. Some commands report it in their response
    /// instead of failing.
    #[error(transparent)]
    Region(#[from] RegionError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Opaque error from the replication/routing layer, forwarded to the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Region error: {message}")]
pub struct RegionError {
    pub message: String,
}

impl RegionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Another transaction committed (or rolled back) the key at or after our start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConflict {
    /// Start timestamp of the transaction that hit the conflict
    pub start_ts: TimeStamp,
    /// Start timestamp of the transaction that owns the existing write
    pub conflict_ts: TimeStamp,
    /// Commit timestamp of the existing write
    pub conflict_commit_ts: TimeStamp,
    pub key: Key,
    pub primary: Key,
}

/// Per-key business errors. These are returned inside responses and never fail a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Another transaction holds the lock on the key
    #[error(
        "Key '{}' is locked by txn {} (primary '{}')",
        .0.key.escape_ascii(),
        .0.lock_version,
        .0.primary_lock.escape_ascii()
    )]
    Locked(LockInfo),
    #[error(
        "Write conflict on key '{}': txn {} committed at {} after our start at {}",
        .0.key.escape_ascii(),
        .0.conflict_ts,
        .0.conflict_commit_ts,
        .0.start_ts
    )]
    Conflict(WriteConflict),
    /// The transaction can not reach the requested outcome, e.g. rolling back a committed key
    #[error("Transaction aborted: {0}")]
    Abort(String),
    /// The request may succeed if retried, e.g. committing a key whose lock is not there yet
    #[error("Retryable: {0}")]
    Retryable(String),
}

impl KeyError {
    pub fn is_locked(&self) -> bool {
        matches!(self, KeyError::Locked(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, KeyError::Conflict(_))
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, KeyError::Abort(_))
    }
}
