//! Ticket name minting.
//!
//! One minter per requester. Names are unique within the process because
//! every name embeds a counter value that is handed out exactly once under
//! a mutex. Across processes, uniqueness rests on the prefix (derived from
//! the PR number or source version) and the timestamp.

use std::sync::{Mutex, PoisonError};

use dlc_ticket_protocol::{Framework, TicketName, TicketTimestamp};

use crate::config::BuildEnv;

/// Prefix used when no PR number is configured.
pub const DEFAULT_PREFIX: &str = "default";

/// Maximum prefix length in characters.
pub const PREFIX_LEN: usize = 7;

/// Derive the ticket-name prefix from a `PR_NUMBER` value.
///
/// `pr/<digits>` becomes `pr` plus the PR id modulo 100000, zero-padded to
/// five digits. Anything else is cut to its first seven characters, which
/// leaves shorter values shorter.
pub fn derive_prefix(pr_number: Option<&str>) -> String {
    let source = match pr_number {
        Some(value) if !value.is_empty() => value,
        _ => DEFAULT_PREFIX,
    };

    if source.contains("pr/") {
        let id = source.rsplit('/').next().unwrap_or_default();
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            // n mod 100000 is the last five decimal digits.
            let tail = &id[id.len().saturating_sub(5)..];
            let n: u32 = tail.parse().unwrap_or(0);
            return format!("pr{:05}", n);
        }
    }

    source.chars().take(PREFIX_LEN).collect()
}

/// Hands out ticket names.
#[derive(Debug)]
pub struct NameMinter {
    prefix: String,
    counter: Mutex<u64>,
}

impl NameMinter {
    /// Minter with an explicit prefix and a counter starting at 0.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Mutex::new(0),
        }
    }

    /// Minter whose prefix comes from the build environment.
    pub fn from_env(env: &BuildEnv) -> Self {
        Self::new(derive_prefix(env.pr_number.as_deref()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next counter value that will be used.
    pub fn peek(&self) -> u64 {
        *self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a fresh name. Concurrent callers always receive distinct
    /// counter values.
    pub fn mint(&self, framework: Framework, timestamp: &TicketTimestamp) -> TicketName {
        let counter = {
            let mut guard = self.counter.lock().unwrap_or_else(PoisonError::into_inner);
            let current = *guard;
            *guard += 1;
            current
        };
        TicketName::compose(&self.prefix, framework, counter, timestamp)
    }
}
