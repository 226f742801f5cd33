use serde::{Deserialize, Serialize};

/// Scheduler settings. Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest user key a command may write, in bytes.
    pub max_key_size: usize,
}

impl Config {
    pub const DEFAULT_MAX_KEY_SIZE: usize = 8 * 1024;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_key_size: Self::DEFAULT_MAX_KEY_SIZE,
        }
    }
}
