use dlc_ticket_protocol::{Folder, PoolEntry, TestLogs};
use tracing::debug;

use super::JobRequester;
use crate::error::RequesterError;
use crate::handle::TicketHandle;
use crate::store::StoreError;

impl JobRequester {
    /// `LOGS` recorded by the executor in the ticket's resource-pool entry.
    ///
    /// Returns `None` when the ticket has no pool entry or the entry carries
    /// no logs yet. Does not wait.
    pub fn fetch_logs(&self, handle: &TicketHandle) -> Result<Option<TestLogs>, RequesterError> {
        let Some(key) = self.first_entry(handle, Folder::ResourcePool)? else {
            debug!(ticket = %handle.ticket_name, "no resource-pool entry");
            return Ok(None);
        };

        let bytes = match self.store.get(&handle.bucket, &key) {
            Ok(bytes) => bytes,
            // The executor renames pool entries as state changes.
            Err(StoreError::NotFound { .. }) => {
                debug!(key = %key, "pool entry moved before it could be read");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let entry =
            PoolEntry::from_slice(&bytes).map_err(|source| RequesterError::MalformedBody {
                key: key.clone(),
                source,
            })?;
        Ok(entry.logs)
    }
}
