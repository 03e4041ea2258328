//! Built-in requester defaults (layer 1)

use serde::{Deserialize, Serialize};

use dlc_ticket_protocol::MAX_TIMEOUT_SECS;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Ticket TIMEOUT_LIMIT in seconds (default: 14400, also the maximum)
    pub timeout_seconds: u64,

    /// Status query attempts (default: 2)
    pub query_max_attempts: u32,

    /// Gap between status query attempts (default: 2000 ms)
    pub query_retry_gap_ms: u64,

    /// Root directory of the filesystem store used by the CLI
    pub store_root: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            timeout_seconds: MAX_TIMEOUT_SECS,
            query_max_attempts: 2,
            query_retry_gap_ms: 2000,
            store_root: ".dlc-tickets".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "timeout_seconds": self.timeout_seconds,
            "query": {
                "max_attempts": self.query_max_attempts,
                "retry_gap_ms": self.query_retry_gap_ms
            },
            "store": {
                "root": self.store_root
            }
        })
    }
}
