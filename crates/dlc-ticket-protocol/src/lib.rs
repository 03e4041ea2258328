//! DLC Ticket Protocol Types
//!
//! Defines the object-store contract between the test job requester and the
//! executor: where tickets live, how they are named, what a ticket body
//! contains and how a ticket's location maps to a status reply.

pub mod body;
pub mod error;
pub mod folder;
pub mod image;
pub mod name;
pub mod pool;
pub mod status;
pub mod timestamp;

pub use body::{decode_body, encode_body, BuildContext, TicketBody};
pub use error::ProtocolError;
pub use folder::Folder;
pub use image::{instance_type_for, Accelerator, Framework, ImageProfile, JobType};
pub use name::{compare_names, extract_timestamp, last_segment, parse_suffix, stem_of, TicketName};
pub use pool::{pool_entry_name, PoolEntry, TestLogs};
pub use status::StatusReply;
pub use timestamp::TicketTimestamp;

/// Bucket shared by requesters and the executor.
pub const TICKET_BUCKET: &str = "dlc-test-tickets";

/// Hard upper bound on a ticket's `TIMEOUT_LIMIT`, in seconds (4 hours).
pub const MAX_TIMEOUT_SECS: u64 = 14400;

/// Extension carried by every ticket object.
pub const TICKET_EXTENSION: &str = ".json";
