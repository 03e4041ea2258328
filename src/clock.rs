//! Submission clock.

use chrono::{Local, NaiveDateTime};
use dlc_ticket_protocol::TicketTimestamp;

/// Source of ticket timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> TicketTimestamp;
}

/// Requester's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TicketTimestamp {
        TicketTimestamp::from_local(Local::now())
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock(TicketTimestamp);

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(TicketTimestamp::from_naive(at))
    }

    pub fn from_timestamp(at: TicketTimestamp) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> TicketTimestamp {
        self.0.clone()
    }
}
