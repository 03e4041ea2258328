//! Request ticket body.
//!
//! The body is the JSON document stored at `request_tickets/<name>`. Key
//! spelling is part of the executor contract. Keys the requester does not
//! know about (for example `LOGS`, added by the executor) survive a
//! decode/encode cycle through [`TicketBody::extra`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::timestamp::TicketTimestamp;

/// Build provenance of the image under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildContext {
    /// Pull request build
    Pr,
    /// Mainline build
    Mainline,
    /// Nightly build
    Nightly,
    /// Developer build
    Dev,
}

impl BuildContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pr => "PR",
            Self::Mainline => "MAINLINE",
            Self::Nightly => "NIGHTLY",
            Self::Dev => "DEV",
        }
    }
}

impl FromStr for BuildContext {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PR" => Ok(Self::Pr),
            "MAINLINE" => Ok(Self::Mainline),
            "NIGHTLY" => Ok(Self::Nightly),
            "DEV" => Ok(Self::Dev),
            _ => Err(ProtocolError::UnknownContext(s.to_string())),
        }
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request ticket payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketBody {
    /// Build provenance.
    #[serde(rename = "CONTEXT")]
    pub context: BuildContext,
    /// Submission time; equals the timestamp embedded in the ticket name.
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: TicketTimestamp,
    /// Image under test.
    #[serde(rename = "ECR-URI")]
    pub ecr_uri: String,
    /// Executor-managed retry counter.
    #[serde(rename = "SCHEDULING_TRIES")]
    pub scheduling_tries: u32,
    /// Number of instances the test needs.
    #[serde(rename = "INSTANCES_NUM")]
    pub instances_num: u32,
    /// Upper bound on execution time, in seconds.
    #[serde(rename = "TIMEOUT_LIMIT")]
    pub timeout_limit: u64,
    /// Source version of the requesting build.
    #[serde(rename = "COMMIT")]
    pub commit: String,
    /// Keys written by other parties.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TicketBody {
    /// Create a fresh body with no scheduling attempts.
    pub fn new(
        context: BuildContext,
        timestamp: TicketTimestamp,
        ecr_uri: impl Into<String>,
        instances_num: u32,
        timeout_limit: u64,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            context,
            timestamp,
            ecr_uri: ecr_uri.into(),
            scheduling_tries: 0,
            instances_num,
            timeout_limit,
            commit: commit.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Encode a body as canonical (RFC 8785) UTF-8 JSON.
pub fn encode_body(body: &TicketBody) -> Result<Vec<u8>, ProtocolError> {
    serde_json_canonicalizer::to_vec(body).map_err(|e| ProtocolError::Encoding(e.to_string()))
}

/// Decode a body, keeping unknown keys.
pub fn decode_body(bytes: &[u8]) -> Result<TicketBody, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}
