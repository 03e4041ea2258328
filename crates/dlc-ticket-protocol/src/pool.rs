//! Resource-pool entries.
//!
//! The executor writes one entry per admitted ticket under
//! `resource_pool/<instance-type>-<job-type>/<stem>#<instances>-<label>.json`
//! and replaces it on every state change. Completed entries carry a `LOGS`
//! object. The requester only reads these.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::TICKET_EXTENSION;

/// Object name the executor uses for a pool entry.
pub fn pool_entry_name(stem: &str, instances_num: u32, label: &str) -> String {
    format!("{}#{}-{}{}", stem, instances_num, label, TICKET_EXTENSION)
}

/// Body of a resource-pool entry. Every field is optional so that entries
/// from older executors still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    #[serde(rename = "REQUEST_TICKET_KEY", skip_serializing_if = "Option::is_none")]
    pub request_ticket_key: Option<String>,
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "INSTANCE_TYPE", skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(rename = "EXECUTOR_ARN", skip_serializing_if = "Option::is_none")]
    pub executor_arn: Option<String>,
    #[serde(rename = "INSTANCES_NUM", skip_serializing_if = "Option::is_none")]
    pub instances_num: Option<u32>,
    #[serde(rename = "LOGS", skip_serializing_if = "Option::is_none")]
    pub logs: Option<TestLogs>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PoolEntry {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// The `LOGS` value of a finished test job, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestLogs(serde_json::Value);

impl TestLogs {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Executor build log, joined into one string.
    pub fn log_stream(&self) -> Option<&str> {
        self.0.get("LOG_STREAM").and_then(|v| v.as_str())
    }

    /// JUnit XML report, empty when the executor found none.
    pub fn xml_report(&self) -> Option<&str> {
        self.0.get("XML_REPORT").and_then(|v| v.as_str())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}
