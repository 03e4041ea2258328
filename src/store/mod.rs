//! Object store capability
//!
//! The requester talks to the ticket bucket only through [`ObjectStore`].
//! Backends:
//! - [`MemoryObjectStore`]: in-process store with failure injection, for tests
//! - [`FsObjectStore`]: directory-backed buckets, used by the CLI
//!
//! Every call is blocking. The store is the source of truth for ticket
//! existence; nothing here caches.

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::{MemoryObjectStore, StoreFailures, StoreOp};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;

/// Canned access-control policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedAcl {
    Private,
    /// The bucket owner (the executor's account) gets full control.
    BucketOwnerFullControl,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "private" => Some(Self::Private),
            "bucket-owner-full-control" => Some(Self::BucketOwnerFullControl),
            _ => None,
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata returned by [`ObjectStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Full key within the bucket.
    pub key: String,
    /// Body size in bytes.
    pub size: u64,
    /// Opaque version tag. The memory backend hashes the body; the
    /// directory backend hashes size and mtime.
    pub etag: String,
    /// Last write time.
    pub last_modified: DateTime<Utc>,
}

/// Errors returned by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("permission denied on {bucket}/{key}: {message}")]
    PermissionDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Retryable backend failure (throttling, network, 5xx).
    #[error("transient store error during {operation}: {message}")]
    Transient { operation: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn transient(operation: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Blob storage operations the requester needs.
///
/// Implementations must be safe to share between threads.
pub trait ObjectStore: Send + Sync {
    /// Create or replace an object.
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError>;

    /// Read an object's body. Missing objects are `StoreError::NotFound`.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove an object. Deleting a missing object succeeds.
    fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// All objects whose key starts with `prefix`, in ascending key order.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError>;

    /// Replace an existing object's ACL.
    fn set_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<(), StoreError>;

    /// Whether any object key starts with `prefix`.
    fn exists_with_prefix(&self, bucket: &str, prefix: &str) -> Result<bool, StoreError> {
        Ok(!self.list(bucket, prefix)?.is_empty())
    }
}

/// SHA-256 hex digest used as the etag.
pub(crate) fn etag_of(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_labels() {
        assert_eq!(CannedAcl::BucketOwnerFullControl.as_str(), "bucket-owner-full-control");
        assert_eq!(
            CannedAcl::from_label("bucket-owner-full-control"),
            Some(CannedAcl::BucketOwnerFullControl)
        );
        assert_eq!(CannedAcl::from_label("public-read"), None);
    }

    #[test]
    fn test_etag_is_sha256() {
        assert_eq!(
            etag_of(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::transient("list", "throttled").is_transient());
        assert!(!StoreError::not_found("b", "k").is_transient());
    }
}
