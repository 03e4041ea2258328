//! Ticket names.
//!
//! A ticket name is the last path segment of a request ticket's key:
//!
//! ```text
//! <prefix>-<framework><counter>_<timestamp>.json
//! ```
//!
//! The *stem* (name without `.json`) is what the executor keeps when it moves
//! a ticket to another folder; it appends `-<label>` (or
//! `#<instances>-<label>`) before re-adding the extension.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::image::Framework;
use crate::timestamp::TicketTimestamp;
use crate::TICKET_EXTENSION;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9]{1,7})-(mxnet|pytorch|tensorflow)(\d+)_(\d{4}(?:-\d{2}){5})\.json$")
            .expect("ticket name pattern compiles")
    })
}

fn timestamp_tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(\d{4}(?:-\d{2}){5})\.json$").expect("timestamp tail pattern compiles"))
}

/// A request ticket name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketName {
    name: String,
    prefix: String,
    framework: Framework,
    counter: u64,
    timestamp: TicketTimestamp,
}

impl TicketName {
    /// Assemble a name from its parts.
    ///
    /// The prefix is taken as given; names composed from unusual prefixes may
    /// not satisfy [`TicketName::parse`].
    pub fn compose(prefix: &str, framework: Framework, counter: u64, timestamp: &TicketTimestamp) -> Self {
        Self {
            name: format!("{}-{}{}_{}{}", prefix, framework, counter, timestamp, TICKET_EXTENSION),
            prefix: prefix.to_string(),
            framework,
            counter,
            timestamp: timestamp.clone(),
        }
    }

    /// Parse and validate a name against the ticket grammar.
    pub fn parse(name: &str) -> Result<Self, ProtocolError> {
        let caps = name_re()
            .captures(name)
            .ok_or_else(|| ProtocolError::MalformedName(name.to_string()))?;

        let framework = Framework::from_label(&caps[2])
            .ok_or_else(|| ProtocolError::MalformedName(name.to_string()))?;
        let counter = caps[3]
            .parse()
            .map_err(|_| ProtocolError::MalformedName(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            prefix: caps[1].to_string(),
            framework,
            counter,
            timestamp: caps[4].parse()?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn timestamp(&self) -> &TicketTimestamp {
        &self.timestamp
    }

    /// Name without the `.json` extension.
    pub fn stem(&self) -> &str {
        stem_of(&self.name)
    }
}

impl TryFrom<String> for TicketName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TicketName> for String {
    fn from(value: TicketName) -> Self {
        value.name
    }
}

impl fmt::Display for TicketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Strip a trailing `.json`, if present.
pub fn stem_of(name: &str) -> &str {
    name.strip_suffix(TICKET_EXTENSION).unwrap_or(name)
}

/// Last `/`-separated segment of a key.
pub fn last_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Extract the embedded timestamp from a ticket name or key.
pub fn extract_timestamp(name: &str) -> Result<TicketTimestamp, ProtocolError> {
    let caps = timestamp_tail_re()
        .captures(name)
        .ok_or_else(|| ProtocolError::MalformedName(name.to_string()))?;
    caps[1].parse()
}

/// Label after the last `-` of a `.json` key.
///
/// For `dead_letter_queue/<stem>-timeout.json` this is `timeout`; for
/// `resource_pool/<pool>/<stem>#1-running.json` it is `running`.
pub fn parse_suffix(key: &str) -> Result<String, ProtocolError> {
    let stem = key
        .strip_suffix(TICKET_EXTENSION)
        .ok_or_else(|| ProtocolError::MissingSuffix(key.to_string()))?;
    match stem.rfind('-') {
        Some(idx) if idx + 1 < stem.len() => Ok(stem[idx + 1..].to_string()),
        _ => Err(ProtocolError::MissingSuffix(key.to_string())),
    }
}

/// Order two ticket names by their embedded timestamps.
pub fn compare_names(a: &str, b: &str) -> Result<Ordering, ProtocolError> {
    Ok(extract_timestamp(a)?.cmp(&extract_timestamp(b)?))
}
