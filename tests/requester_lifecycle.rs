//! Requester lifecycle tests
//!
//! Drives tickets through submit, status, cancel and log retrieval against
//! an in-memory bucket, with a simulated executor moving tickets between
//! folders.

mod fixtures;

use std::sync::Arc;
use std::time::{Duration, Instant};

use dlc_test_requester::{
    Attempts, BuildContext, CancelOutcome, FixedClock, JobRequester, MemoryObjectStore,
    ObjectStore, RequesterError, RetryPolicy, StatusReply,
};
use dlc_test_requester::store::{StoreError, StoreFailures, StoreOp};
use dlc_ticket_protocol::{decode_body, extract_timestamp, JobType};
use fixtures::{put_pending, requester_at, ExecutorSim, BUCKET, TF_GPU_IMAGE};

const NOON: &str = "2024-05-01-12-00-00";

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_submit_names_ticket_from_pr_and_clock() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/123456", NOON);

    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    assert_eq!(handle.ticket_name, "pr23456-tensorflow0_2024-05-01-12-00-00.json");
    assert_eq!(handle.instance_type, "ml.p3.8xlarge");
    assert_eq!(handle.job_type, JobType::Training);
    assert_eq!(handle.bucket, BUCKET);
    assert!(store.contains(BUCKET, &handle.request_key()));
}

#[test]
fn test_body_timestamp_matches_name() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/77", "2023-12-31-23-59-59");

    for image in [
        "pytorch-inference:1.5.1-cpu-py36",
        "huggingface-pytorch-training:4.6-gpu",
        "mxnet-training:1.8.0-gpu-py37",
    ] {
        let handle = requester.submit(image, BuildContext::Nightly, 2).unwrap();
        let body = decode_body(&store.get(BUCKET, &handle.request_key()).unwrap()).unwrap();
        assert_eq!(extract_timestamp(&handle.ticket_name).unwrap(), body.timestamp);
        assert_eq!(body.timestamp, handle.timestamp);
        assert_eq!(body.context, BuildContext::Nightly);
        assert_eq!(body.commit, "0123abc");
    }
}

#[test]
fn test_image_without_job_type_writes_nothing() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/1", NOON);

    let err = requester
        .submit("tensorflow-serving:2.2.0-gpu", BuildContext::Pr, 1)
        .unwrap_err();

    assert!(matches!(err, RequesterError::InvalidImage { .. }));
    assert!(store.keys(BUCKET).is_empty());
    assert!(store.journal().is_empty());
}

#[test]
fn test_acl_denied_leaves_ticket_in_place() {
    let store = MemoryObjectStore::new();
    store.set_failures(StoreFailures {
        deny_acl: true,
        ..StoreFailures::default()
    });
    let requester = requester_at(&store, "pr/1", NOON);

    let err = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap_err();

    assert!(matches!(
        err,
        RequesterError::Store(StoreError::PermissionDenied { .. })
    ));
    assert_eq!(
        store.keys(BUCKET),
        vec!["request_tickets/pr00001-tensorflow0_2024-05-01-12-00-00.json"]
    );
}

#[test]
fn test_transient_put_failure_propagates() {
    let store = MemoryObjectStore::new();
    store.set_failures(StoreFailures {
        fail_puts: 1,
        ..StoreFailures::default()
    });
    let requester = requester_at(&store, "pr/1", NOON);

    let err = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap_err();
    assert!(err.is_transient());
    assert!(store.keys(BUCKET).is_empty());
}

// =============================================================================
// Status
// =============================================================================

#[test]
fn test_queue_position_counts_earlier_tickets() {
    let store = MemoryObjectStore::new();
    put_pending(&store, "pr00002-mxnet0_2024-05-01-11-00-00.json");
    put_pending(&store, "zzzzzzz-pytorch4_2024-05-01-11-30-00.json");
    put_pending(&store, "aaaaaaa-pytorch1_2024-05-01-13-00-00.json");
    let requester = requester_at(&store, "pr/123456", NOON);

    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::Queuing { queue_num: 2 }
    );
}

#[test]
fn test_queue_rank_for_every_pending_ticket() {
    let store = MemoryObjectStore::new();
    let stamps = [
        "2024-05-01-12-00-03",
        "2024-05-01-12-00-01",
        "2024-05-01-12-00-04",
        "2024-05-01-12-00-02",
    ];
    let handles: Vec<_> = stamps
        .iter()
        .map(|at| {
            requester_at(&store, "pr/9", at)
                .submit("mxnet-inference:1.6.0-cpu", BuildContext::Pr, 1)
                .unwrap()
        })
        .collect();

    let requester = requester_at(&store, "pr/9", NOON);
    let ranks: Vec<_> = handles
        .iter()
        .map(|h| match requester.query(h).unwrap() {
            StatusReply::Queuing { queue_num } => queue_num,
            other => panic!("expected queuing, got {:?}", other),
        })
        .collect();
    assert_eq!(ranks, vec![2, 0, 3, 1]);
}

#[test]
fn test_dead_letter_reports_reason() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    let key = ExecutorSim::new(&store).dead_letter(&handle, "timeout");
    assert_eq!(
        key,
        "dead_letter_queue/pr23456-tensorflow0_2024-05-01-12-00-00-timeout.json"
    );

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::Failed {
            reason: "timeout".into()
        }
    );
}

#[test]
fn test_duplicate_reports_failed() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/5", NOON);
    let handle = requester
        .submit("pytorch-training:1.6.0-gpu", BuildContext::Pr, 1)
        .unwrap();

    ExecutorSim::new(&store).reject_duplicate(&handle);

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::Failed {
            reason: "duplicatePR".into()
        }
    );
}

#[test]
fn test_pool_entry_without_instance_marker() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    store.delete(BUCKET, &handle.request_key()).unwrap();
    store
        .put(
            BUCKET,
            "resource_pool/ml.p3.8xlarge-training/pr23456-tensorflow0_2024-05-01-12-00-00-running.json",
            b"{}",
        )
        .unwrap();

    assert_eq!(requester.query(&handle).unwrap(), StatusReply::Running);
}

#[test]
fn test_full_lifecycle_through_pool() {
    let store = MemoryObjectStore::new();
    let executor = ExecutorSim::new(&store);
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 3).unwrap();

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::Queuing { queue_num: 0 }
    );
    assert!(requester.fetch_logs(&handle).unwrap().is_none());

    let key = executor.admit(&handle);
    assert!(key.ends_with("#3-preparing.json"));
    assert_eq!(requester.query(&handle).unwrap(), StatusReply::Preparing);

    executor.advance(&handle, "running");
    assert_eq!(requester.query(&handle).unwrap(), StatusReply::Running);
    assert!(requester.fetch_logs(&handle).unwrap().is_none());

    executor.complete(&handle, "build log line", "<testsuites/>");
    let reply = requester.query(&handle).unwrap();
    assert_eq!(reply, StatusReply::Completed);
    assert!(reply.is_terminal());

    let logs = requester.fetch_logs(&handle).unwrap().expect("logs");
    assert_eq!(logs.log_stream(), Some("build log line"));
    assert_eq!(logs.xml_report(), Some("<testsuites/>"));
}

#[test]
fn test_runtime_error_label() {
    let store = MemoryObjectStore::new();
    let executor = ExecutorSim::new(&store);
    let requester = requester_at(&store, "pr/2", NOON);
    let handle = requester
        .submit("mxnet-training:1.8.0-cpu", BuildContext::Mainline, 1)
        .unwrap();

    executor.admit(&handle);
    executor.advance(&handle, "runtimeError");

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::RuntimeError {
            reason: "runtimeError".into()
        }
    );
}

#[test]
fn test_listing_lag_is_absorbed_by_retry() {
    let store = MemoryObjectStore::new();
    store.set_failures(StoreFailures {
        list_lag: 1,
        ..StoreFailures::default()
    });
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    assert_eq!(
        requester.query(&handle).unwrap(),
        StatusReply::Queuing { queue_num: 0 }
    );
}

#[test]
fn test_transient_list_failure_propagates() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/1", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    store.set_failures(StoreFailures {
        fail_lists: 1,
        ..StoreFailures::default()
    });

    let err = requester.query(&handle).unwrap_err();
    assert!(err.is_transient());
}

// =============================================================================
// Retry pacing
// =============================================================================

fn paced_requester(store: &MemoryObjectStore, retry: RetryPolicy) -> JobRequester {
    JobRequester::builder(Arc::new(store.clone()))
        .clock(FixedClock::from_timestamp(NOON.parse().unwrap()))
        .retry(retry)
        .build()
}

#[test]
fn test_missing_ticket_waits_between_attempts() {
    let store = MemoryObjectStore::new();
    let requester = paced_requester(
        &store,
        RetryPolicy {
            attempts: Attempts::new(3).unwrap(),
            gap: Duration::from_millis(50),
        },
    );
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    store.delete(BUCKET, &handle.request_key()).unwrap();

    let started = Instant::now();
    let err = requester.query(&handle).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, RequesterError::NotFound { .. }));
    // Two gaps for three attempts, none after the last.
    assert!(elapsed >= Duration::from_millis(100), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "waited {:?}", elapsed);
}

#[test]
fn test_single_attempt_never_sleeps() {
    let store = MemoryObjectStore::new();
    let requester = paced_requester(
        &store,
        RetryPolicy {
            attempts: Attempts::new(1).unwrap(),
            gap: Duration::from_secs(5),
        },
    );
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    store.delete(BUCKET, &handle.request_key()).unwrap();

    let started = Instant::now();
    let err = requester.query(&handle).unwrap_err();

    assert!(matches!(err, RequesterError::NotFound { .. }));
    assert!(started.elapsed() < Duration::from_millis(50));
}

// =============================================================================
// Cancel
// =============================================================================

#[test]
fn test_cancel_pending_then_query_not_found() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    assert_eq!(requester.cancel(&handle).unwrap(), CancelOutcome::Removed);
    assert!(!store.contains(BUCKET, &handle.request_key()));

    let err = requester.query(&handle).unwrap_err();
    assert!(matches!(err, RequesterError::NotFound { ref ticket } if *ticket == handle.ticket_name));
}

#[test]
fn test_cancel_twice_matches_cancel_once() {
    let store = MemoryObjectStore::new();
    put_pending(&store, "default-mxnet0_2024-01-01-00-00-00.json");
    let requester = requester_at(&store, "pr/123456", NOON);
    let handle = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    requester.cancel(&handle).unwrap();
    let after_first = store.keys(BUCKET);
    requester.cancel(&handle).unwrap();

    assert_eq!(store.keys(BUCKET), after_first);
    assert_eq!(after_first, vec!["request_tickets/default-mxnet0_2024-01-01-00-00-00.json"]);
}

#[test]
fn test_cancel_after_admission_touches_nothing() {
    let store = MemoryObjectStore::new();
    let executor = ExecutorSim::new(&store);
    let requester = requester_at(&store, "pr/3", NOON);

    let running = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    executor.admit(&running);
    executor.advance(&running, "running");
    let failed = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    executor.dead_letter(&failed, "maxRetries");

    store.clear_journal();
    assert_eq!(requester.cancel(&running).unwrap(), CancelOutcome::NotPending);
    assert_eq!(requester.cancel(&failed).unwrap(), CancelOutcome::NotPending);
    assert!(store.journal().is_empty());
    assert_eq!(requester.query(&running).unwrap(), StatusReply::Running);
}

#[test]
fn test_cancel_only_deletes_own_ticket() {
    let store = MemoryObjectStore::new();
    let requester = requester_at(&store, "pr/4", NOON);
    let first = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();
    let second = requester.submit(TF_GPU_IMAGE, BuildContext::Pr, 1).unwrap();

    store.clear_journal();
    requester.cancel(&first).unwrap();

    assert_eq!(
        store.journal(),
        vec![StoreOp::Delete {
            bucket: BUCKET.to_string(),
            key: first.request_key(),
        }]
    );
    assert!(store.contains(BUCKET, &second.request_key()));
}
