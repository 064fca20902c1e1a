use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tracing::info;

use super::names::{DEFAULT_REGION, validate_bucket_name, validate_region};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Bucket, Identity};

/// Per-owner catalog of buckets and their backing directories.
///
/// Every lookup is keyed by the caller's user id; a bucket owned by someone
/// else is indistinguishable from one that does not exist.
pub struct BucketRegistry {
    store: Arc<dyn Store>,
    storage_root: PathBuf,
    default_region: String,
}

impl BucketRegistry {
    pub fn new(store: Arc<dyn Store>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            storage_root: storage_root.into(),
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    fn bucket_root(&self, owner_id: &str, name: &str) -> PathBuf {
        // Owner ids are not restricted to a path-safe charset.
        self.storage_root
            .join(hex::encode(owner_id.as_bytes()))
            .join(name)
    }

    /// Creates the bucket directory and then its catalog record.
    ///
    /// A failure between the two steps leaves an orphaned directory behind,
    /// which a later create of the same name reuses.
    pub async fn create(
        &self,
        identity: &Identity,
        name: &str,
        region: Option<&str>,
    ) -> Result<Bucket> {
        validate_bucket_name(name)?;

        let region = match region.map(str::trim) {
            Some(r) if !r.is_empty() => {
                validate_region(r)?;
                r.to_string()
            }
            _ => self.default_region.clone(),
        };

        if self.store.get_bucket(&identity.user_id, name)?.is_some() {
            return Err(Error::Conflict("Bucket already exists".to_string()));
        }

        let bucket = Bucket {
            name: name.to_string(),
            owner_id: identity.user_id.clone(),
            region,
            created_at: Utc::now(),
            storage_root: self.bucket_root(&identity.user_id, name),
        };

        fs::create_dir_all(&bucket.storage_root).await?;
        self.store.create_bucket(&bucket)?;

        info!(owner = %bucket.owner_id, bucket = %bucket.name, region = %bucket.region, "created bucket");
        Ok(bucket)
    }

    pub fn list(&self, identity: &Identity) -> Result<Vec<Bucket>> {
        self.store.list_buckets(&identity.user_id)
    }

    pub fn get(&self, identity: &Identity, name: &str) -> Result<Bucket> {
        self.store
            .get_bucket(&identity.user_id, name)?
            .ok_or(Error::NotFound("Bucket"))
    }

    /// Removes the bucket's directory tree, then its catalog record.
    pub async fn delete(&self, identity: &Identity, name: &str) -> Result<()> {
        let bucket = self.get(identity, name)?;

        match fs::remove_dir_all(&bucket.storage_root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        if !self.store.delete_bucket(&bucket.owner_id, &bucket.name)? {
            return Err(Error::NotFound("Bucket"));
        }

        info!(owner = %bucket.owner_id, bucket = %bucket.name, "deleted bucket");
        Ok(())
    }
}
