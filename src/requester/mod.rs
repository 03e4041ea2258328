//! Test job requester
//!
//! Submits test requests as tickets in the shared bucket and answers
//! questions about them by looking at which folder each ticket sits in.
//!
//! Operations:
//! - `submit`: write a new ticket to `request_tickets/`
//! - `query`: derive a status reply from the ticket's current folder
//! - `cancel`: remove a still-pending ticket
//! - `fetch_logs`: read the `LOGS` of a finished test job
//!
//! The requester holds no state beyond its name counter; every answer comes
//! from the store.

mod cancel;
mod logs;
mod status;
mod submit;

pub use cancel::CancelOutcome;

use std::fmt;
use std::sync::Arc;

use dlc_ticket_protocol::{MAX_TIMEOUT_SECS, TICKET_BUCKET};

use crate::clock::{Clock, SystemClock};
use crate::config::{BuildEnv, RequesterConfig};
use crate::minter::NameMinter;
use crate::retry::RetryPolicy;
use crate::store::ObjectStore;

/// Client for the ticket protocol.
pub struct JobRequester {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    minter: NameMinter,
    clock: Arc<dyn Clock>,
    env: BuildEnv,
    timeout_limit: u64,
    retry: RetryPolicy,
}

impl fmt::Debug for JobRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRequester")
            .field("bucket", &self.bucket)
            .field("minter", &self.minter)
            .field("env", &self.env)
            .field("timeout_limit", &self.timeout_limit)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl JobRequester {
    /// Requester configured from merged settings and the process environment.
    pub fn new(store: Arc<dyn ObjectStore>, config: &RequesterConfig) -> Self {
        Self::builder(store)
            .timeout(config.effective_timeout())
            .retry(config.retry)
            .env(BuildEnv::from_env())
            .build()
    }

    pub fn builder(store: Arc<dyn ObjectStore>) -> JobRequesterBuilder {
        JobRequesterBuilder {
            store,
            clock: Arc::new(SystemClock),
            env: BuildEnv::default(),
            timeout: MAX_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// TIMEOUT_LIMIT written to every ticket.
    pub fn timeout_limit(&self) -> u64 {
        self.timeout_limit
    }

    pub fn minter(&self) -> &NameMinter {
        &self.minter
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

/// Builder for [`JobRequester`].
pub struct JobRequesterBuilder {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    env: BuildEnv,
    timeout: u64,
    retry: RetryPolicy,
}

impl JobRequesterBuilder {
    /// Requested timeout in seconds, clamped to `1..=14400`.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn env(mut self, env: BuildEnv) -> Self {
        self.env = env;
        self
    }

    pub fn build(self) -> JobRequester {
        JobRequester {
            store: self.store,
            bucket: TICKET_BUCKET.to_string(),
            minter: NameMinter::from_env(&self.env),
            clock: self.clock,
            env: self.env,
            timeout_limit: self.timeout.clamp(1, MAX_TIMEOUT_SECS),
            retry: self.retry,
        }
    }
}
