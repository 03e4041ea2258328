//! Test fixtures for requester scenario tests
//!
//! Provides an executor simulator that moves tickets between folders the
//! way the real executor does, plus helpers for building requesters with a
//! fixed clock and no retry delay.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dlc_test_requester::{
    Attempts, BuildEnv, FixedClock, JobRequester, MemoryObjectStore, ObjectStore, RetryPolicy,
    TicketHandle,
};
use dlc_ticket_protocol::{decode_body, pool_entry_name, Folder, PoolEntry, TestLogs};
use serde_json::json;

pub const BUCKET: &str = "dlc-test-tickets";

/// Image used by most scenarios.
pub const TF_GPU_IMAGE: &str =
    "763104351884.dkr.ecr.us-west-2.amazonaws.com/tensorflow-training:2.2.0-gpu-py37-cu101-ubuntu18.04";

/// Retry policy with the given number of attempts and no sleeping.
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts: Attempts::new(attempts).expect("attempts must be positive"),
        gap: Duration::ZERO,
    }
}

/// Requester over `store` with a fixed clock and PR environment.
pub fn requester_at(store: &MemoryObjectStore, pr_number: &str, at: &str) -> JobRequester {
    JobRequester::builder(Arc::new(store.clone()))
        .clock(FixedClock::from_timestamp(at.parse().expect("valid timestamp")))
        .env(BuildEnv {
            pr_number: Some(pr_number.to_string()),
            source_version: Some("0123abc".to_string()),
        })
        .retry(fast_retry(2))
        .build()
}

/// Drop a pending ticket into the queue without going through a requester.
pub fn put_pending(store: &MemoryObjectStore, name: &str) {
    store
        .put(BUCKET, &Folder::RequestTickets.key(name), b"{}")
        .expect("put pending ticket");
}

/// Stand-in for the executor. It owns the bucket's folder transitions.
pub struct ExecutorSim {
    store: MemoryObjectStore,
}

impl ExecutorSim {
    pub fn new(store: &MemoryObjectStore) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// Move a pending ticket into its resource pool as `preparing`.
    pub fn admit(&self, handle: &TicketHandle) -> String {
        let body = self
            .store
            .get(BUCKET, &handle.request_key())
            .expect("pending ticket");
        let body = decode_body(&body).expect("ticket body");
        self.store
            .delete(BUCKET, &handle.request_key())
            .expect("delete pending");

        let entry = PoolEntry {
            request_ticket_key: Some(handle.request_key()),
            status: Some("preparing".to_string()),
            instance_type: Some(handle.instance_type.clone()),
            executor_arn: Some("arn:aws:codebuild:us-west-2:000000000000:build/executor:1".into()),
            instances_num: Some(body.instances_num),
            ..PoolEntry::default()
        };
        self.write_pool_entry(handle, &entry)
    }

    /// Rename the pool entry to a new state label.
    pub fn advance(&self, handle: &TicketHandle, label: &str) -> String {
        let (old_key, mut entry) = self.current_pool_entry(handle);
        self.store.delete(BUCKET, &old_key).expect("delete old entry");
        entry.status = Some(label.to_string());
        self.write_pool_entry(handle, &entry)
    }

    /// Finish the job and attach its logs.
    pub fn complete(&self, handle: &TicketHandle, log_stream: &str, xml_report: &str) -> String {
        let (old_key, mut entry) = self.current_pool_entry(handle);
        self.store.delete(BUCKET, &old_key).expect("delete old entry");
        entry.status = Some("completed".to_string());
        entry.logs = Some(TestLogs::new(json!({
            "LOG_STREAM": log_stream,
            "XML_REPORT": xml_report,
        })));
        self.write_pool_entry(handle, &entry)
    }

    /// Give up on a pending ticket.
    pub fn dead_letter(&self, handle: &TicketHandle, reason: &str) -> String {
        self.move_to_failure_folder(handle, Folder::DeadLetterQueue, reason)
    }

    /// Reject a pending ticket as a duplicate PR request.
    pub fn reject_duplicate(&self, handle: &TicketHandle) -> String {
        self.move_to_failure_folder(handle, Folder::DuplicatePrRequests, "duplicatePR")
    }

    fn move_to_failure_folder(&self, handle: &TicketHandle, folder: Folder, reason: &str) -> String {
        let body = self
            .store
            .get(BUCKET, &handle.request_key())
            .expect("pending ticket");
        self.store
            .delete(BUCKET, &handle.request_key())
            .expect("delete pending");
        let key = folder.key(&format!("{}-{}.json", handle.stem(), reason));
        self.store.put(BUCKET, &key, &body).expect("put failed ticket");
        key
    }

    fn current_pool_entry(&self, handle: &TicketHandle) -> (String, PoolEntry) {
        let listed = self
            .store
            .list(BUCKET, &handle.probe_prefix(Folder::ResourcePool))
            .expect("list pool");
        let key = listed.into_iter().next().expect("pool entry").key;
        let bytes = self.store.get(BUCKET, &key).expect("get pool entry");
        (key, PoolEntry::from_slice(&bytes).expect("pool entry body"))
    }

    fn write_pool_entry(&self, handle: &TicketHandle, entry: &PoolEntry) -> String {
        let name = pool_entry_name(
            handle.stem(),
            entry.instances_num.unwrap_or(1),
            entry.status.as_deref().unwrap_or("preparing"),
        );
        let key = Folder::ResourcePool.key(&format!(
            "{}-{}/{}",
            handle.instance_type, handle.job_type, name
        ));
        self.store
            .put(BUCKET, &key, &entry.to_vec().expect("encode entry"))
            .expect("put pool entry");
        key
    }
}
