//! Runs commands against a [`Storage`], one apply cycle per command.
//!
//! In a replicated deployment this is the job of the apply pipeline behind the consensus log;
//! the [`Scheduler`] gives the same guarantees in-process: commands touching overlapping keys
//! never interleave, and the writes of one command land atomically.

mod latches;

pub use latches::{LatchGuard, Latches};

use crate::commands::Command;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mvcc::{MvccTxn, RoTxn};
use crate::storage::Storage;
use crate::types::Key;
use std::sync::Arc;
use tracing::trace;

pub struct Scheduler {
    storage: Arc<dyn Storage>,
    latches: Latches,
    config: Config,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .finish()
    }
}

impl Scheduler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, Config::default())
    }

    pub fn with_config(storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            storage,
            latches: Latches::new(),
            config,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one command to completion and returns its response.
    ///
    /// The read phase works on a snapshot taken without latches. The write phase runs on a
    /// fresh snapshot once every key the command can touch is latched, and its queued writes
    /// are applied only if it succeeded.
    pub fn run<C: Command>(&self, mut command: C) -> Result<C::Response> {
        let start_ts = command.start_ts();
        let mut keys = command.will_write();
        self.check_key_sizes(&keys)?;

        let snapshot = self.storage.snapshot()?;
        let outcome = command.read(&RoTxn::new(snapshot.as_ref(), start_ts))?;
        drop(snapshot);
        if let Some(response) = outcome.response {
            trace!(start_ts, "command answered from read phase");
            return Ok(response);
        }
        keys.extend(outcome.keys);

        let guard = self.latches.acquire(keys);
        let snapshot = self.storage.snapshot()?;
        let mut txn = MvccTxn::new(snapshot.as_ref(), start_ts);
        let response = command.prepare_writes(&mut txn)?;

        let modifies = txn.into_modifies();
        debug_assert!(
            modifies.iter().all(|modify| guard
                .keys()
                .binary_search_by(|key| key.as_slice().cmp(modify.key()))
                .is_ok()),
            "command wrote a key it did not latch"
        );
        trace!(start_ts, modifies = modifies.len(), "applying writes");
        self.storage.write(modifies)?;
        Ok(response)
    }

    fn check_key_sizes(&self, keys: &[Key]) -> Result<()> {
        let limit = self.config.max_key_size;
        match keys.iter().find(|key| key.len() > limit) {
            Some(key) => Err(Error::KeyTooLarge {
                size: key.len(),
                limit,
            }),
            None => Ok(()),
        }
    }
}
