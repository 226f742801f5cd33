//! Lock and write records, and the per-command transaction context.

mod lock;
mod txn;
mod write;

pub use lock::{Lock, LockInfo};
pub use txn::{MvccTxn, RoTxn};
pub use write::{Write, WriteKind};
