use std::thread;

use dlc_ticket_protocol::{
    extract_timestamp, parse_suffix, Folder, StatusReply, TicketTimestamp,
    TICKET_EXTENSION,
};
use tracing::{debug, info, warn};

use super::JobRequester;
use crate::error::RequesterError;
use crate::handle::TicketHandle;

impl JobRequester {
    /// Current status of a submitted ticket.
    ///
    /// Each attempt checks the queue, then the dead-letter queue, then the
    /// duplicate folder, then the resource pool. The first folder holding the
    /// ticket decides the reply. When no folder does, the query sleeps for
    /// the retry gap and tries again, up to the configured attempt count.
    pub fn query(&self, handle: &TicketHandle) -> Result<StatusReply, RequesterError> {
        let attempts = self.retry.attempts.get();
        for attempt in 1..=attempts {
            if let Some(reply) = self.probe(handle)? {
                info!(
                    ticket = %handle.ticket_name,
                    status = reply.as_str(),
                    attempt,
                    "resolved ticket status"
                );
                return Ok(reply);
            }
            debug!(ticket = %handle.ticket_name, attempt, "ticket not found in any folder");
            if attempt < attempts && !self.retry.gap.is_zero() {
                thread::sleep(self.retry.gap);
            }
        }

        warn!(
            ticket = %handle.ticket_name,
            attempts,
            "ticket not found after all attempts"
        );
        Err(RequesterError::NotFound {
            ticket: handle.ticket_name.clone(),
        })
    }

    /// 0-based position of the ticket among queued tickets, ordered by
    /// submission timestamp. `None` when the ticket is not queued.
    pub fn queue_position(&self, handle: &TicketHandle) -> Result<Option<usize>, RequesterError> {
        let folder = Folder::RequestTickets.prefix();
        let listed = self.store.list(&handle.bucket, &folder)?;

        let mut queued: Vec<(TicketTimestamp, &str)> = Vec::with_capacity(listed.len());
        for meta in &listed {
            if !meta.key.ends_with(TICKET_EXTENSION) {
                continue;
            }
            // Names are everything after the folder; a prefix may contain `/`.
            let name = meta.key.strip_prefix(folder.as_str()).unwrap_or(&meta.key);
            match extract_timestamp(name) {
                Ok(timestamp) => queued.push((timestamp, name)),
                Err(err) => debug!(key = %meta.key, error = %err, "skipping queued key"),
            }
        }

        // Stable: equal timestamps keep listing order.
        queued.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(queued
            .iter()
            .position(|(_, name)| *name == handle.ticket_name))
    }

    fn probe(&self, handle: &TicketHandle) -> Result<Option<StatusReply>, RequesterError> {
        for folder in Folder::PROBE_ORDER {
            let reply = match folder {
                Folder::RequestTickets => self
                    .queue_position(handle)?
                    .map(|queue_num| StatusReply::Queuing { queue_num }),
                _ => self.folder_reply(handle, folder)?,
            };
            if reply.is_some() {
                return Ok(reply);
            }
        }
        Ok(None)
    }

    /// Reply implied by the ticket's entry in a non-queue folder.
    fn folder_reply(
        &self,
        handle: &TicketHandle,
        folder: Folder,
    ) -> Result<Option<StatusReply>, RequesterError> {
        let Some(key) = self.first_entry(handle, folder)? else {
            return Ok(None);
        };
        let label = parse_suffix(&key)?;
        if folder.is_failure() {
            return Ok(Some(StatusReply::Failed { reason: label }));
        }
        match StatusReply::from_pool_label(&label) {
            Some(reply) => Ok(Some(reply)),
            None => Err(RequesterError::UnrecognizedState { key, label }),
        }
    }

    /// First `.json` key under the ticket's prefix in `folder`.
    pub(super) fn first_entry(
        &self,
        handle: &TicketHandle,
        folder: Folder,
    ) -> Result<Option<String>, RequesterError> {
        let listed = self
            .store
            .list(&handle.bucket, &handle.probe_prefix(folder))?;
        Ok(listed
            .into_iter()
            .map(|meta| meta.key)
            .find(|key| key.ends_with(TICKET_EXTENSION)))
    }
}
