//! Folder layout inside the ticket bucket.

use std::fmt;

/// Logical queues, one key prefix each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// Pending tickets, written by requesters.
    RequestTickets,
    /// Tickets the executor has admitted, grouped by `<instance-type>-<job-type>`.
    ResourcePool,
    /// Tickets that failed terminally.
    DeadLetterQueue,
    /// Tickets suppressed as duplicates of a newer request.
    DuplicatePrRequests,
}

impl Folder {
    /// Probe order used by status queries. Mirrors the executor's state
    /// machine: a ticket is looked for in the queue, then in the two
    /// terminal-failure folders, then in the pool.
    pub const PROBE_ORDER: [Folder; 4] = [
        Folder::RequestTickets,
        Folder::DeadLetterQueue,
        Folder::DuplicatePrRequests,
        Folder::ResourcePool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestTickets => "request_tickets",
            Self::ResourcePool => "resource_pool",
            Self::DeadLetterQueue => "dead_letter_queue",
            Self::DuplicatePrRequests => "duplicate_pr_requests",
        }
    }

    /// `<folder>/`
    pub fn prefix(&self) -> String {
        format!("{}/", self.as_str())
    }

    /// `<folder>/<rest>`
    pub fn key(&self, rest: &str) -> String {
        format!("{}/{}", self.as_str(), rest)
    }

    /// Whether a ticket found here has failed for good.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::DeadLetterQueue | Self::DuplicatePrRequests)
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
