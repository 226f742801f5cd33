//! Transactional commands.
//!
//! A command runs in up to two phases against the store:
//!
//! 1. [`Command::read`]: optional. Commands that can not know their write set up front (only
//!    [`ResolveLock`] today) look it up here. They may also answer right away.
//! 2. [`Command::prepare_writes`]: checks the keys and queues lock/write/value changes in the
//!    [`MvccTxn`]. The caller applies the queued changes atomically, and only if this phase
//!    returned `Ok`.
//!
//! Conflicts a client can act on are returned inside the response as [`KeyError`]s;
//! `Err` means the command failed as a whole.
//!
//! [`KeyError`]: crate::KeyError

mod commit;
mod finalize;
mod prewrite;
mod resolve;
mod rollback;

pub use commit::{Commit, CommitResponse};
pub use finalize::{commit_key, rollback_key};
pub use prewrite::{Prewrite, PrewriteResponse};
pub use resolve::{ResolveLock, ResolveLockResponse};
pub use rollback::{Rollback, RollbackResponse};

use crate::error::Result;
use crate::mvcc::{MvccTxn, RoTxn};
use crate::types::{Key, TimeStamp};

/// Result of a command's read phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome<R> {
    /// Answer for the client. When set, the write phase is skipped.
    pub response: Option<R>,
    /// Keys the write phase will touch on top of [`Command::will_write`].
    pub keys: Vec<Key>,
}

impl<R> ReadOutcome<R> {
    pub fn latch(keys: Vec<Key>) -> Self {
        Self {
            response: None,
            keys,
        }
    }

    pub fn respond(response: R) -> Self {
        Self {
            response: Some(response),
            keys: Vec::new(),
        }
    }

    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> ReadOutcome<T> {
        ReadOutcome {
            response: self.response.map(f),
            keys: self.keys,
        }
    }
}

impl<R> Default for ReadOutcome<R> {
    fn default() -> Self {
        Self::latch(Vec::new())
    }
}

pub trait Command {
    type Response;

    /// The transaction this command acts for.
    fn start_ts(&self) -> TimeStamp;

    /// Keys the command may write, known before reading anything.
    fn will_write(&self) -> Vec<Key>;

    fn read(&mut self, _txn: &RoTxn<'_>) -> Result<ReadOutcome<Self::Response>> {
        Ok(ReadOutcome::default())
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<Self::Response>;
}

/// Every command the store understands.
#[derive(Debug, Clone)]
pub enum TxnCommand {
    Prewrite(Prewrite),
    Commit(Commit),
    Rollback(Rollback),
    ResolveLock(ResolveLock),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Prewrite(PrewriteResponse),
    Commit(CommitResponse),
    Rollback(RollbackResponse),
    ResolveLock(ResolveLockResponse),
}

macro_rules! impl_from_command {
    ($($variant:ident => $command:ty, $response:ty;)*) => {
        $(
            impl From<$command> for TxnCommand {
                fn from(command: $command) -> Self {
                    TxnCommand::$variant(command)
                }
            }

            impl From<$response> for Response {
                fn from(response: $response) -> Self {
                    Response::$variant(response)
                }
            }
        )*
    };
}

impl_from_command! {
    Prewrite => Prewrite, PrewriteResponse;
    Commit => Commit, CommitResponse;
    Rollback => Rollback, RollbackResponse;
    ResolveLock => ResolveLock, ResolveLockResponse;
}

impl Command for TxnCommand {
    type Response = Response;

    fn start_ts(&self) -> TimeStamp {
        match self {
            TxnCommand::Prewrite(c) => c.start_ts(),
            TxnCommand::Commit(c) => c.start_ts(),
            TxnCommand::Rollback(c) => c.start_ts(),
            TxnCommand::ResolveLock(c) => c.start_ts(),
        }
    }

    fn will_write(&self) -> Vec<Key> {
        match self {
            TxnCommand::Prewrite(c) => c.will_write(),
            TxnCommand::Commit(c) => c.will_write(),
            TxnCommand::Rollback(c) => c.will_write(),
            TxnCommand::ResolveLock(c) => c.will_write(),
        }
    }

    fn read(&mut self, txn: &RoTxn<'_>) -> Result<ReadOutcome<Response>> {
        Ok(match self {
            TxnCommand::Prewrite(c) => c.read(txn)?.map(Response::from),
            TxnCommand::Commit(c) => c.read(txn)?.map(Response::from),
            TxnCommand::Rollback(c) => c.read(txn)?.map(Response::from),
            TxnCommand::ResolveLock(c) => c.read(txn)?.map(Response::from),
        })
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<Response> {
        Ok(match self {
            TxnCommand::Prewrite(c) => c.prepare_writes(txn)?.into(),
            TxnCommand::Commit(c) => c.prepare_writes(txn)?.into(),
            TxnCommand::Rollback(c) => c.prepare_writes(txn)?.into(),
            TxnCommand::ResolveLock(c) => c.prepare_writes(txn)?.into(),
        })
    }
}
