//! Ticket timestamps.
//!
//! Tickets carry their submission time as `YYYY-MM-DD-HH-MM-SS` in the
//! requester's local clock, without a timezone suffix. Every field is
//! fixed-width and zero-padded, so comparing two timestamps as strings is the
//! same as comparing them chronologically.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDateTime};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// strftime pattern for ticket timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}(-\d{2}){5}$").expect("timestamp pattern compiles"))
}

/// A validated `YYYY-MM-DD-HH-MM-SS` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketTimestamp(String);

impl TicketTimestamp {
    /// Format a naive (wall-clock) datetime.
    pub fn from_naive(at: NaiveDateTime) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Format a local datetime, dropping the offset.
    pub fn from_local(at: DateTime<Local>) -> Self {
        Self::from_naive(at.naive_local())
    }

    /// Current local time.
    pub fn now() -> Self {
        Self::from_local(Local::now())
    }

    /// Parse back into a naive datetime.
    ///
    /// The grammar only fixes the shape, so a well-formed string may still
    /// name an impossible date; that case returns `MalformedTimestamp`.
    pub fn to_naive(&self) -> Result<NaiveDateTime, ProtocolError> {
        NaiveDateTime::parse_from_str(&self.0, TIMESTAMP_FORMAT)
            .map_err(|_| ProtocolError::MalformedTimestamp(self.0.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TicketTimestamp {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if timestamp_re().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ProtocolError::MalformedTimestamp(s.to_string()))
        }
    }
}

impl TryFrom<String> for TicketTimestamp {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketTimestamp> for String {
    fn from(value: TicketTimestamp) -> Self {
        value.0
    }
}

impl fmt::Display for TicketTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
