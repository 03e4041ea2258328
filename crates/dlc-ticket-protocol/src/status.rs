//! Status replies.
//!
//! A status reply is derived entirely from where a ticket currently sits in
//! the bucket. Serialized form: `{"status": "queuing", "queueNum": 2}`,
//! `{"status": "failed", "reason": "timeout"}`, `{"status": "running"}`.

use serde::{Deserialize, Serialize};

/// Status of a submitted ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum StatusReply {
    /// Ticket is pending; `queue_num` is its 0-based rank by timestamp.
    #[serde(rename = "queuing")]
    Queuing {
        #[serde(rename = "queueNum")]
        queue_num: usize,
    },
    /// Executor is provisioning instances.
    #[serde(rename = "preparing")]
    Preparing,
    /// Tests are running.
    #[serde(rename = "running")]
    Running,
    /// Tests finished; logs are available.
    #[serde(rename = "completed")]
    Completed,
    /// Ticket landed in the dead-letter or duplicate folder.
    #[serde(rename = "failed")]
    Failed { reason: String },
    /// Executor reported an error while running the tests.
    ///
    /// The executor records nothing beyond the pool state label, so
    /// `reason` is that label (`runtimeError`). Error detail, when any, is in
    /// the entry's `LOGS`.
    #[serde(rename = "runtimeError")]
    RuntimeError { reason: String },
}

impl StatusReply {
    /// Map a resource-pool state label to a reply.
    ///
    /// Returns `None` for labels the executor is not known to write. A
    /// `runtimeError` reply carries the label itself as its reason.
    pub fn from_pool_label(label: &str) -> Option<Self> {
        match label {
            "preparing" => Some(Self::Preparing),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "runtimeError" => Some(Self::RuntimeError {
                reason: label.to_string(),
            }),
            _ => None,
        }
    }

    /// Wire name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queuing { .. } => "queuing",
            Self::Preparing => "preparing",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
            Self::RuntimeError { .. } => "runtimeError",
        }
    }

    /// No further folder transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed { .. } | Self::RuntimeError { .. }
        )
    }
}
