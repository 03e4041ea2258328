//! Request handle.

use dlc_ticket_protocol::{stem_of, Folder, JobType, TicketTimestamp};
use serde::{Deserialize, Serialize};

/// What `submit` hands back. Everything later calls need to find the ticket
/// again; losing it means losing the ability to query or cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHandle {
    /// Bucket the ticket was written to.
    pub bucket: String,
    /// Ticket name (last key segment).
    pub ticket_name: String,
    /// Image under test.
    pub image: String,
    /// Instance type the executor will file the ticket under.
    pub instance_type: String,
    pub job_type: JobType,
    /// Submission timestamp, as embedded in the name.
    pub timestamp: TicketTimestamp,
}

impl TicketHandle {
    /// Ticket name without `.json`.
    pub fn stem(&self) -> &str {
        stem_of(&self.ticket_name)
    }

    /// Key of the pending ticket.
    pub fn request_key(&self) -> String {
        Folder::RequestTickets.key(&self.ticket_name)
    }

    /// Prefix matching this ticket in `folder`.
    pub fn probe_prefix(&self, folder: Folder) -> String {
        match folder {
            Folder::ResourcePool => Folder::ResourcePool.key(&format!(
                "{}-{}/{}",
                self.instance_type,
                self.job_type,
                self.stem()
            )),
            other => other.key(self.stem()),
        }
    }
}
