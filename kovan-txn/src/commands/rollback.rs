use crate::commands::{Command, rollback_key};
use crate::error::{Error, KeyError, RegionError, Result};
use crate::mvcc::MvccTxn;
use crate::types::{Key, TimeStamp};

/// Rolls back the given keys of a transaction, whether or not they were ever prewritten.
#[derive(Debug, Clone)]
pub struct Rollback {
    keys: Vec<Key>,
    start_ts: TimeStamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackResponse {
    pub error: Option<KeyError>,
    pub region_error: Option<RegionError>,
}

impl Rollback {
    pub fn new(keys: Vec<Key>, start_ts: TimeStamp) -> Self {
        Self { keys, start_ts }
    }
}

impl Command for Rollback {
    type Response = RollbackResponse;

    fn start_ts(&self) -> TimeStamp {
        self.start_ts
    }

    fn will_write(&self) -> Vec<Key> {
        self.keys.clone()
    }

    fn prepare_writes(&mut self, txn: &mut MvccTxn<'_>) -> Result<RollbackResponse> {
        let mut response = RollbackResponse::default();
        for key in &self.keys {
            match rollback_key(txn, key) {
                Ok(None) => {}
                Ok(Some(key_error)) => {
                    response.error.get_or_insert(key_error);
                }
                Err(Error::Region(region_error)) => {
                    response.region_error.get_or_insert(region_error);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(response)
    }
}
