//! DLC test requester
//!
//! Client side of the DLC test-ticket protocol. A requester submits test
//! jobs as JSON tickets into a shared object-store bucket and learns their
//! status from which folder the tickets currently sit in. An executor owned
//! by another account moves tickets between folders; the requester never
//! talks to it directly.

pub mod clock;
pub mod config;
pub mod error;
pub mod handle;
pub mod minter;
pub mod requester;
pub mod retry;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BuildEnv, ConfigError, RequesterConfig};
pub use error::RequesterError;
pub use handle::TicketHandle;
pub use minter::{derive_prefix, NameMinter};
pub use requester::{CancelOutcome, JobRequester, JobRequesterBuilder};
pub use retry::{Attempts, RetryPolicy};
pub use store::{
    CannedAcl, FsObjectStore, MemoryObjectStore, ObjectMeta, ObjectStore, StoreError,
};

pub use dlc_ticket_protocol::{BuildContext, StatusReply, TestLogs};
