#![doc(
    html_logo_url = "https://raw.githubusercontent.com/vertexclique/kovan/master/art/kovan-square.svg"
)]
//! # Kovan Txn
//!
//! `kovan-txn` is the transactional core of a Percolator-style distributed key-value store:
//! the commands a storage node applies to run optimistic two-phase commit (2PC) over a
//! multi-versioned store.
//!
//! ## How it works
//!
//! Every key has three kinds of state, kept in separate columns of the store:
//!
//! - **Locks**: at most one per key, written by prewrite. A lock names its owner (the
//!   transaction's start timestamp) and the transaction's primary key.
//! - **Writes**: the append-only history of a key, one record per commit timestamp. A record
//!   is either a committed write or a rollback marker.
//! - **Values**: the data itself, versioned by the start timestamp of the transaction that
//!   wrote it.
//!
//! Commands never touch the store directly. Each one is handed an [`MvccTxn`] bound to a
//! consistent snapshot, queues the lock/write/value changes it wants, and the surrounding
//! apply pipeline writes the whole batch atomically. Transactions are finalized purely from
//! the persisted lock state: [`ResolveLock`] rediscovers a transaction's keys by scanning
//! locks, and a secondary key only ever commits if its primary did.
//!
//! ## Example
//!
//! ```rust
//! use kovan_txn::{
//!     Commit, LocalTimestampOracle, MemStorage, Mutation, Prewrite, Scheduler, TimestampOracle,
//! };
//! use std::sync::Arc;
//!
//! let scheduler = Scheduler::new(Arc::new(MemStorage::new()));
//! let oracle = LocalTimestampOracle::new();
//!
//! // 1. Prewrite both keys, "k1" is the primary
//! let start_ts = oracle.get_timestamp();
//! let mutations = vec![
//!     Mutation::put(b"k1".to_vec(), b"v1".to_vec()),
//!     Mutation::put(b"k2".to_vec(), b"v2".to_vec()),
//! ];
//! let resp = scheduler
//!     .run(Prewrite::new(mutations, b"k1".to_vec(), start_ts, 3000))
//!     .unwrap();
//! assert!(resp.errors.is_empty());
//!
//! // 2. Commit the primary first, then the secondary
//! let commit_ts = oracle.get_timestamp();
//! for key in [b"k1", b"k2"] {
//!     let resp = scheduler
//!         .run(Commit::new(vec![key.to_vec()], start_ts, commit_ts))
//!         .unwrap();
//!     assert!(resp.error.is_none());
//! }
//! ```

pub mod commands;
pub mod config;
mod error;
pub mod mvcc;
pub mod scheduler;
pub mod storage;
mod timestamp_oracle;
mod types;

pub use crate::commands::{
    Command, Commit, Prewrite, ResolveLock, Response, Rollback, TxnCommand,
};
pub use crate::config::Config;
pub use crate::error::{Error, KeyError, RegionError, Result, WriteConflict};
pub use crate::mvcc::{Lock, LockInfo, MvccTxn, RoTxn, Write, WriteKind};
pub use crate::scheduler::Scheduler;
pub use crate::storage::{MemStorage, Modify, Snapshot, Storage};
pub use crate::timestamp_oracle::{LocalTimestampOracle, TimestampOracle};
pub use crate::types::{Key, Mutation, Op, TimeStamp, Value};
