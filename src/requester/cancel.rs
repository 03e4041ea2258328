use dlc_ticket_protocol::Folder;
use serde::Serialize;
use tracing::info;

use super::JobRequester;
use crate::error::RequesterError;
use crate::handle::TicketHandle;

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Pending ticket was deleted; it will never be scheduled.
    Removed,
    /// Ticket was rejected as a duplicate; nothing to remove.
    Duplicate,
    /// Ticket is no longer pending. It was admitted, has finished, or was
    /// already removed.
    NotPending,
}

impl CancelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::Duplicate => "duplicate",
            Self::NotPending => "not_pending",
        }
    }
}

impl JobRequester {
    /// Cancel a ticket that has not been picked up yet.
    ///
    /// Only `request_tickets/` is ever modified. Tickets already in the
    /// resource pool keep running.
    pub fn cancel(&self, handle: &TicketHandle) -> Result<CancelOutcome, RequesterError> {
        let queued = self
            .store
            .exists_with_prefix(&handle.bucket, &handle.probe_prefix(Folder::RequestTickets))?;
        if queued {
            self.store.delete(&handle.bucket, &handle.request_key())?;
            info!(ticket = %handle.ticket_name, "removed pending ticket");
            return Ok(CancelOutcome::Removed);
        }

        let duplicate = self.store.exists_with_prefix(
            &handle.bucket,
            &handle.probe_prefix(Folder::DuplicatePrRequests),
        )?;
        if duplicate {
            info!(ticket = %handle.ticket_name, "ticket was rejected as a duplicate");
            return Ok(CancelOutcome::Duplicate);
        }

        info!(
            ticket = %handle.ticket_name,
            "ticket is no longer pending, leaving it alone"
        );
        Ok(CancelOutcome::NotPending)
    }
}
