use crate::types::TimeStamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of transaction timestamps. Start and commit timestamps of every client must come
/// from the same oracle.
pub trait TimestampOracle: Send + Sync {
    /// Returns a timestamp greater than every one returned before. Never 0, which
    /// `ResolveLock` reserves for "roll back".
    fn get_timestamp(&self) -> TimeStamp;
}

/// Single-node oracle backed by an atomic counter.
#[derive(Debug, Default)]
pub struct LocalTimestampOracle {
    last: AtomicU64,
}

impl LocalTimestampOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle whose first timestamp is `last + 1`, e.g. to continue after a restart.
    pub fn with_initial(last: TimeStamp) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }
}

impl TimestampOracle for LocalTimestampOracle {
    fn get_timestamp(&self) -> TimeStamp {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }
}
