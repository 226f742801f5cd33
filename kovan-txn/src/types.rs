/// A user key. Versioning is handled by the store, not encoded in the key.
pub type Key = Vec<u8>;

pub type Value = Vec<u8>;

/// Logical timestamp handed out by a [`TimestampOracle`](crate::TimestampOracle).
pub type TimeStamp = u64;

/// Operation requested for one key of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Put,
    Del,
    /// Only meaningful for pessimistic cleanup; rejected by prewrite.
    Rollback,
    /// Read lock without a value; rejected by prewrite.
    Lock,
}

/// A client-requested change to a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub key: Key,
    pub value: Value,
    pub op: Op,
}

impl Mutation {
    pub fn put(key: Key, value: Value) -> Self {
        Self {
            key,
            value,
            op: Op::Put,
        }
    }

    pub fn delete(key: Key) -> Self {
        Self {
            key,
            value: Vec::new(),
            op: Op::Del,
        }
    }
}
