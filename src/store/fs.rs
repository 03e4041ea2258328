//! Directory-backed object store.
//!
//! Layout under the root directory:
//! - `<bucket>/<key>`: object bodies (`/` in keys become directories)
//! - `.acl/<bucket>/<key>`: canned ACL label of each object
//! - `.staging/`: in-flight writes, renamed into place when complete

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use super::{etag_of, CannedAcl, ObjectMeta, ObjectStore, StoreError};

const ACL_DIR: &str = ".acl";
const STAGING_DIR: &str = ".staging";

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(checked(bucket)?).join(checked(key)?))
    }

    fn acl_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(ACL_DIR).join(checked(bucket)?).join(checked(key)?))
    }

    /// Write via a staging file and an atomic rename.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = self.root.join(STAGING_DIR).join(format!(
            "{}-{}",
            std::process::id(),
            STAGING_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::write(&staging, contents)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

/// Reject keys that would escape the bucket directory.
fn checked(key: &str) -> Result<&Path, StoreError> {
    let path = Path::new(key);
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(path)
    } else {
        Err(StoreError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid object key: {key}"),
        )))
    }
}

fn not_found_as<T>(err: io::Error, bucket: &str, key: &str) -> Result<T, StoreError> {
    if err.kind() == io::ErrorKind::NotFound {
        Err(StoreError::not_found(bucket, key))
    } else {
        Err(StoreError::Io(err))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        self.write_atomic(&path, body)?;
        self.write_atomic(&self.acl_path(bucket, key)?, CannedAcl::Private.as_str().as_bytes())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).or_else(|e| not_found_as(e, bucket, key))
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        for path in [self.object_path(bucket, key)?, self.acl_path(bucket, key)?] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let bucket_dir = self.root.join(checked(bucket)?);
        if !bucket_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut listed = Vec::new();
        for entry in WalkDir::new(&bucket_dir).min_depth(1) {
            // Concurrent deletes can remove files or directories mid-walk.
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    continue
                }
                Err(e) => return Err(StoreError::Io(e.into())),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&bucket_dir) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !key.starts_with(prefix) {
                continue;
            }

            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let last_modified: DateTime<Utc> = metadata.modified()?.into();
            listed.push(ObjectMeta {
                key,
                size: metadata.len(),
                etag: version_tag(metadata.len(), &last_modified),
                last_modified,
            });
        }
        listed.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listed)
    }

    fn set_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<(), StoreError> {
        if !self.object_path(bucket, key)?.is_file() {
            return Err(StoreError::not_found(bucket, key));
        }
        self.write_atomic(&self.acl_path(bucket, key)?, acl.as_str().as_bytes())
    }
}

impl FsObjectStore {
    /// ACL recorded for an object.
    pub fn acl(&self, bucket: &str, key: &str) -> Result<Option<CannedAcl>, StoreError> {
        match fs::read_to_string(self.acl_path(bucket, key)?) {
            Ok(label) => Ok(CannedAcl::from_label(label.trim())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Version tag from size and mtime, so listing never opens object bodies.
fn version_tag(size: u64, modified: &DateTime<Utc>) -> String {
    let nanos = modified.timestamp_nanos_opt().unwrap_or_else(|| modified.timestamp());
    etag_of(format!("{}:{}", size, nanos).as_bytes())
}
