use crate::types::TimeStamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Put,
    Delete,
    Rollback,
}

/// Entry of a key's write history, stored under its commit timestamp.
/// Rollback markers are stored under the start timestamp of the rolled back transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    pub start_ts: TimeStamp,
    pub kind: WriteKind,
}

impl Write {
    pub fn new(start_ts: TimeStamp, kind: WriteKind) -> Self {
        Self { start_ts, kind }
    }

    pub fn rollback(start_ts: TimeStamp) -> Self {
        Self::new(start_ts, WriteKind::Rollback)
    }

    pub fn is_rollback(&self) -> bool {
        self.kind == WriteKind::Rollback
    }
}
