//! In-memory object store.
//!
//! Thread-safe via `RwLock`; clones share the same buckets. Besides plain
//! storage it can inject failures and record every mutating call, which is
//! what the scenario tests assert against.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::{etag_of, CannedAcl, ObjectMeta, ObjectStore, StoreError};

/// A mutating call observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Put { bucket: String, key: String },
    Delete { bucket: String, key: String },
    SetAcl { bucket: String, key: String, acl: CannedAcl },
}

/// Failure injection configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreFailures {
    /// Reject every `set_acl` with `PermissionDenied`.
    pub deny_acl: bool,
    /// Fail the next N `put` calls with a transient error.
    pub fail_puts: u32,
    /// Fail the next N `get` calls with a transient error.
    pub fail_gets: u32,
    /// Fail the next N `delete` calls with a transient error.
    pub fail_deletes: u32,
    /// Fail the next N `list` calls with a transient error.
    pub fail_lists: u32,
    /// Newly created objects stay out of this many list results.
    pub list_lag: u32,
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    acl: CannedAcl,
    last_modified: DateTime<Utc>,
    /// Remaining list calls that will not see this object yet.
    hidden_lists: u32,
}

#[derive(Debug, Default)]
struct MemoryInner {
    objects: BTreeMap<(String, String), StoredObject>,
    failures: StoreFailures,
    journal: Vec<StoreOp>,
}

/// In-memory store for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the failure injection configuration.
    pub fn set_failures(&self, failures: StoreFailures) {
        self.write_inner().failures = failures;
    }

    /// Mutating calls recorded so far, oldest first.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.read_inner().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.write_inner().journal.clear();
    }

    /// All keys in a bucket, ignoring list lag.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.read_inner()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.read_inner()
            .objects
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Current ACL of an object.
    pub fn acl(&self, bucket: &str, key: &str) -> Option<CannedAcl> {
        self.read_inner()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.acl)
    }

    // Inspection helpers see through a poisoned lock; store operations
    // report it as `StoreError::Poisoned`.
    fn read_inner(&self) -> RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(counter: &mut u32, operation: &str) -> Result<(), StoreError> {
        if *counter > 0 {
            *counter -= 1;
            return Err(StoreError::transient(operation, "injected failure"));
        }
        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Self::take_failure(&mut inner.failures.fail_puts, "put")?;

        let id = (bucket.to_string(), key.to_string());
        // Overwrites keep whatever lag the key still has.
        let hidden_lists = inner
            .objects
            .get(&id)
            .map(|o| o.hidden_lists)
            .unwrap_or(inner.failures.list_lag);
        // A plain put resets the ACL, as S3 does.
        inner.objects.insert(
            id,
            StoredObject {
                body: body.to_vec(),
                acl: CannedAcl::Private,
                last_modified: Utc::now(),
                hidden_lists,
            },
        );
        inner.journal.push(StoreOp::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Self::take_failure(&mut inner.failures.fail_gets, "get")?;

        inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Self::take_failure(&mut inner.failures.fail_deletes, "delete")?;

        inner.objects.remove(&(bucket.to_string(), key.to_string()));
        inner.journal.push(StoreOp::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Self::take_failure(&mut inner.failures.fail_lists, "list")?;

        let mut listed = Vec::new();
        for ((b, key), object) in inner.objects.iter_mut() {
            if b != bucket || !key.starts_with(prefix) {
                continue;
            }
            if object.hidden_lists > 0 {
                object.hidden_lists -= 1;
                continue;
            }
            listed.push(ObjectMeta {
                key: key.clone(),
                size: object.body.len() as u64,
                etag: etag_of(&object.body),
                last_modified: object.last_modified,
            });
        }
        Ok(listed)
    }

    fn set_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if inner.failures.deny_acl {
            return Err(StoreError::PermissionDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "injected AccessDenied".to_string(),
            });
        }

        let object = inner
            .objects
            .get_mut(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| StoreError::not_found(bucket, key))?;
        object.acl = acl;
        inner.journal.push(StoreOp::SetAcl {
            bucket: bucket.to_string(),
            key: key.to_string(),
            acl,
        });
        Ok(())
    }
}
