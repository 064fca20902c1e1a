use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use super::BucketRegistry;
use super::path::{resolve, validate_file_name};
use crate::error::{Error, Result};
use crate::types::{Bucket, Identity, Item, ItemKind, StorageUsage};

pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// File and folder operations inside buckets.
///
/// Every operation first resolves the bucket for the calling identity and
/// then resolves each caller-supplied path with [`resolve`] before touching
/// the filesystem.
pub struct ObjectStore {
    buckets: Arc<BucketRegistry>,
    tmp_dir: PathBuf,
    max_upload_bytes: u64,
}

impl ObjectStore {
    /// `tmp_dir` holds in-flight uploads and must be on the same filesystem
    /// as the bucket storage root.
    pub fn new(buckets: Arc<BucketRegistry>, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            buckets,
            tmp_dir: tmp_dir.into(),
            max_upload_bytes: MAX_UPLOAD_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    fn locate(&self, identity: &Identity, bucket: &str, path: &str) -> Result<(Bucket, PathBuf)> {
        let bucket = self.buckets.get(identity, bucket)?;
        let target = resolve(&bucket.storage_root, path)?;
        Ok((bucket, target))
    }

    /// Lists the immediate children of `folder`. A folder that does not exist
    /// yields an empty list.
    pub async fn browse(&self, identity: &Identity, bucket: &str, folder: &str) -> Result<Vec<Item>> {
        let (_, dir) = self.locate(identity, bucket, folder)?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) if e.kind() == ErrorKind::NotADirectory => {
                return Err(Error::BadRequest("Path is not a folder".to_string()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match fs::metadata(entry.path()).await {
                Ok(m) => m,
                // Removed between listing and stat, or a dangling link.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::Io(e)),
            };

            let kind = if metadata.is_dir() {
                ItemKind::Folder
            } else {
                ItemKind::File
            };

            items.push(Item {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                size: (kind == ItemKind::File).then_some(metadata.len()),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        Ok(items)
    }

    /// Ensures `folder` and its missing ancestors exist.
    pub async fn create_folder(&self, identity: &Identity, bucket: &str, folder: &str) -> Result<()> {
        let (_, dir) = self.locate(identity, bucket, folder)?;

        match fs::create_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists || e.kind() == ErrorKind::NotADirectory => {
                Err(Error::Conflict("A file exists at that path".to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Starts a streamed upload into `bucket`. The destination is chosen when
    /// the session is finished.
    ///
    /// Nothing appears in the bucket until [`UploadSession::finish`] succeeds.
    /// An upload whose declared size already exceeds the limit is rejected
    /// before any bytes are accepted.
    pub async fn begin_upload(
        &self,
        identity: &Identity,
        bucket: &str,
        declared_size: Option<u64>,
    ) -> Result<UploadSession> {
        let bucket = self.buckets.get(identity, bucket)?;

        if declared_size.is_some_and(|size| size > self.max_upload_bytes) {
            return Err(Error::TooLarge {
                limit: self.max_upload_bytes,
            });
        }

        fs::create_dir_all(&self.tmp_dir).await?;
        let temp_path = self.tmp_dir.join(Uuid::new_v4().to_string());
        let file = File::create(&temp_path).await?;

        Ok(UploadSession {
            bucket,
            temp_path,
            file: Some(file),
            written: 0,
            limit: self.max_upload_bytes,
        })
    }

    /// Uploads the full contents of `reader` as `folder/name`, overwriting any
    /// existing file. Returns the number of bytes stored.
    pub async fn upload<R>(
        &self,
        identity: &Identity,
        bucket: &str,
        folder: &str,
        name: &str,
        mut reader: R,
        declared_size: Option<u64>,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        // Reject bad destinations before reading any bytes.
        validate_file_name(name)?;
        let (_, dir) = self.locate(identity, bucket, folder)?;
        resolve(&dir, name)?;

        let mut session = self.begin_upload(identity, bucket, declared_size).await?;

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    session.abort().await;
                    return Err(Error::Io(e));
                }
            };
            session.write_chunk(&buf[..n]).await?;
        }

        session.finish(folder, name).await
    }

    /// Opens a file for reading. Returns the reader and file size.
    pub async fn download(
        &self,
        identity: &Identity,
        bucket: &str,
        path: &str,
    ) -> Result<(BufReader<File>, u64)> {
        let (bucket, target) = self.locate(identity, bucket, path)?;
        if target == bucket.storage_root {
            return Err(Error::NotFound("File"));
        }

        let metadata = fs::metadata(&target)
            .await
            .map_err(|e| Error::from_io(e, "File"))?;
        if !metadata.is_file() {
            return Err(Error::NotFound("File"));
        }

        let file = File::open(&target)
            .await
            .map_err(|e| Error::from_io(e, "File"))?;

        Ok((BufReader::new(file), metadata.len()))
    }

    /// Deletes a file, or a folder with everything beneath it.
    pub async fn delete_item(&self, identity: &Identity, bucket: &str, path: &str) -> Result<()> {
        let (bucket, target) = self.locate(identity, bucket, path)?;
        if target == bucket.storage_root {
            return Err(Error::BadRequest(
                "Path is required; delete the bucket to remove everything".to_string(),
            ));
        }

        let metadata = fs::symlink_metadata(&target)
            .await
            .map_err(|e| Error::from_io(e, "Item"))?;

        let result = if metadata.is_dir() {
            fs::remove_dir_all(&target).await
        } else {
            fs::remove_file(&target).await
        };
        result.map_err(|e| Error::from_io(e, "Item"))?;

        info!(bucket = %bucket.name, path = %path, "deleted item");
        Ok(())
    }

    /// Moves an entry within a bucket. Fails if `new_path` already exists.
    pub async fn rename(
        &self,
        identity: &Identity,
        bucket: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<()> {
        let (bucket, from) = self.locate(identity, bucket, old_path)?;
        let to = resolve(&bucket.storage_root, new_path)?;

        if from == bucket.storage_root || to == bucket.storage_root {
            return Err(Error::BadRequest(
                "Cannot rename the bucket root".to_string(),
            ));
        }

        fs::symlink_metadata(&from)
            .await
            .map_err(|e| Error::from_io(e, "Item"))?;

        if fs::symlink_metadata(&to).await.is_ok() {
            return Err(Error::Conflict("Target path already exists".to_string()));
        }

        if to.starts_with(&from) {
            return Err(Error::BadRequest(
                "Cannot move a folder into itself".to_string(),
            ));
        }

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await.map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists | ErrorKind::NotADirectory => {
                    Error::Conflict("A file exists along the target path".to_string())
                }
                _ => Error::Io(e),
            })?;
        }

        fs::rename(&from, &to)
            .await
            .map_err(|e| Error::from_io(e, "Item"))?;

        info!(bucket = %bucket.name, from = %old_path, to = %new_path, "renamed item");
        Ok(())
    }

    /// Totals the files, folders and bytes across the caller's buckets.
    pub async fn usage(&self, identity: &Identity) -> Result<StorageUsage> {
        let buckets = self.buckets.list(identity)?;
        let mut usage = StorageUsage {
            buckets: buckets.len() as u64,
            ..StorageUsage::default()
        };

        for bucket in buckets {
            walk(&bucket.storage_root, &mut usage).await?;
        }

        Ok(usage)
    }
}

async fn walk(root: &Path, usage: &mut StorageUsage) -> Result<()> {
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                usage.folders += 1;
                pending.push(entry.path());
            } else if file_type.is_file() {
                usage.files += 1;
                usage.bytes += entry.metadata().await?.len();
            }
        }
    }

    Ok(())
}

/// An upload in progress, spooled to a temp file outside the bucket.
///
/// Dropping an unfinished session removes its temp file.
pub struct UploadSession {
    bucket: Bucket,
    temp_path: PathBuf,
    file: Option<File>,
    written: u64,
    limit: u64,
}

impl UploadSession {
    /// Appends a chunk. Exceeding the size limit aborts the upload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.written + chunk.len() as u64 > self.limit {
            self.abort().await;
            return Err(Error::TooLarge { limit: self.limit });
        }

        let Some(file) = self.file.as_mut() else {
            return Err(Error::BadRequest("Upload already closed".to_string()));
        };

        if let Err(e) = file.write_all(chunk).await {
            self.abort().await;
            return Err(Error::Io(e));
        }

        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Moves the completed file to `folder/name` inside the bucket, creating
    /// the folder if needed and replacing any existing file of that name.
    /// Returns the number of bytes stored.
    pub async fn finish(mut self, folder: &str, name: &str) -> Result<u64> {
        let Some(mut file) = self.file.take() else {
            return Err(Error::BadRequest("Upload already closed".to_string()));
        };

        let destination = validate_file_name(name)
            .and_then(|()| resolve(&self.bucket.storage_root, folder))
            .and_then(|dir| resolve(&dir, name).map(|path| (dir, path)));
        let (dir, final_path) = match destination {
            Ok(d) => d,
            Err(e) => {
                drop(file);
                remove_temp(&self.temp_path).await;
                return Err(e);
            }
        };

        let committed: std::io::Result<()> = async {
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::create_dir_all(&dir).await?;
            fs::rename(&self.temp_path, &final_path).await
        }
        .await;

        if let Err(e) = committed {
            remove_temp(&self.temp_path).await;
            return Err(match e.kind() {
                ErrorKind::IsADirectory | ErrorKind::DirectoryNotEmpty => {
                    Error::Conflict("A folder exists with that name".to_string())
                }
                ErrorKind::AlreadyExists | ErrorKind::NotADirectory => {
                    Error::Conflict("A file exists along the target folder".to_string())
                }
                _ => Error::Io(e),
            });
        }

        info!(
            bucket = %self.bucket.name,
            path = %final_path.display(),
            size = self.written,
            "stored upload"
        );
        Ok(self.written)
    }

    /// Discards everything written so far.
    pub async fn abort(&mut self) {
        if self.file.take().is_some() {
            remove_temp(&self.temp_path).await;
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                warn!("Failed to remove upload temp file {}: {e}", self.temp_path.display());
            }
        }
    }
}

async fn remove_temp(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove upload temp file {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as Kind;
    use crate::store::{SqliteStore, Store};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        registry: Arc<BucketRegistry>,
        objects: ObjectStore,
        tmp_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let registry = Arc::new(BucketRegistry::new(
            Arc::new(store),
            temp.path().join("storage"),
        ));
        let tmp_dir = temp.path().join("tmp");
        let objects = ObjectStore::new(registry.clone(), &tmp_dir);
        Fixture {
            _temp: temp,
            registry,
            objects,
            tmp_dir,
        }
    }

    fn user(id: &str) -> Identity {
        Identity::user(id, None)
    }

    async fn put(f: &Fixture, folder: &str, name: &str, data: &[u8]) -> u64 {
        f.objects
            .upload(&user("u1"), "b", folder, name, data, Some(data.len() as u64))
            .await
            .unwrap()
    }

    fn temp_is_empty(f: &Fixture) -> bool {
        std::fs::read_dir(&f.tmp_dir)
            .map(|mut d| d.next().is_none())
            .unwrap_or(true)
    }

    #[tokio::test]
    async fn test_upload_browse_download() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        assert_eq!(put(&f, "", "a.txt", b"0123456789").await, 10);

        let items = f.objects.browse(&user("u1"), "b", "").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "a.txt");
        assert_eq!(items[0].kind, ItemKind::File);
        assert_eq!(items[0].size, Some(10));

        let (mut reader, size) = f
            .objects
            .download(&user("u1"), "b", "a.txt")
            .await
            .unwrap();
        assert_eq!(size, 10);
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"0123456789");
        assert!(temp_is_empty(&f));
    }

    #[tokio::test]
    async fn test_upload_creates_folder_and_overwrites() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        put(&f, "docs/2024", "r.txt", b"first").await;
        put(&f, "docs/2024", "r.txt", b"second!").await;

        let items = f.objects.browse(&user("u1"), "b", "docs").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Folder);
        assert_eq!(items[0].size, None);

        let items = f
            .objects
            .browse(&user("u1"), "b", "docs/2024")
            .await
            .unwrap();
        assert_eq!(items[0].size, Some(7));
    }

    #[tokio::test]
    async fn test_upload_too_large_leaves_nothing() {
        let f = fixture();
        let objects = ObjectStore::new(f.registry.clone(), &f.tmp_dir).with_max_upload_bytes(16);
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let data = vec![7u8; 100 * 1024];
        let err = objects
            .upload(&user("u1"), "b", "deep/folder", "big.bin", &data[..], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TooLarge { limit: 16 }));
        assert_eq!(err.kind(), Kind::InvalidInput);

        assert!(f.objects.browse(&user("u1"), "b", "").await.unwrap().is_empty());
        assert!(temp_is_empty(&f));
    }

    #[tokio::test]
    async fn test_declared_size_rejected_up_front() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let result = f
            .objects
            .begin_upload(&user("u1"), "b", Some(MAX_UPLOAD_SIZE + 1))
            .await;
        assert!(matches!(result, Err(Error::TooLarge { .. })));
        assert!(temp_is_empty(&f));
    }

    #[tokio::test]
    async fn test_dropped_session_cleans_temp() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let mut session = f
            .objects
            .begin_upload(&user("u1"), "b", None)
            .await
            .unwrap();
        session.write_chunk(b"partial").await.unwrap();
        assert!(!temp_is_empty(&f));
        drop(session);

        assert!(temp_is_empty(&f));
        assert!(f.objects.browse(&user("u1"), "b", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_destination_checked_at_finish() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let mut session = f
            .objects
            .begin_upload(&user("u1"), "b", None)
            .await
            .unwrap();
        session.write_chunk(b"escape").await.unwrap();
        let err = session.finish("../../", "x.txt").await.unwrap_err();
        assert_eq!(err.kind(), Kind::Forbidden);
        assert!(temp_is_empty(&f));

        let mut session = f
            .objects
            .begin_upload(&user("u1"), "b", None)
            .await
            .unwrap();
        session.write_chunk(b"late folder").await.unwrap();
        assert_eq!(session.finish("in/here", "f.txt").await.unwrap(), 11);
        let items = f.objects.browse(&user("u1"), "b", "in/here").await.unwrap();
        assert_eq!(items[0].name, "f.txt");
    }

    #[tokio::test]
    async fn test_upload_onto_folder_conflicts() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        f.objects.create_folder(&user("u1"), "b", "taken/child").await.unwrap();

        let err = f
            .objects
            .upload(&user("u1"), "b", "", "taken", &b"x"[..], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Conflict);
        assert!(temp_is_empty(&f));
    }

    #[tokio::test]
    async fn test_browse_missing_folder_is_empty() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let items = f.objects.browse(&user("u1"), "b", "nope").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        let err = f
            .objects
            .browse(&user("u1"), "b", "../../")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Forbidden);

        let err = f
            .objects
            .download(&user("u1"), "b", "a/../../../etc/passwd")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Forbidden);

        let err = f
            .objects
            .upload(&user("u1"), "b", "", "../x", &b"x"[..], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Forbidden);
    }

    #[tokio::test]
    async fn test_other_owner_bucket_is_not_found() {
        let f = fixture();
        f.registry.create(&user("u1"), "data", None).await.unwrap();
        f.registry.create(&user("u2"), "data", None).await.unwrap();
        f.objects
            .upload(&user("u1"), "data", "", "mine.txt", &b"u1"[..], None)
            .await
            .unwrap();

        let items = f.objects.browse(&user("u2"), "data", "").await.unwrap();
        assert!(items.is_empty());

        for path in ["", "../", "../../75312f64617461"] {
            let err = f
                .objects
                .browse(&user("u3"), "data", path)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), Kind::NotFound, "{path}");
        }
    }

    #[tokio::test]
    async fn test_create_folder_is_idempotent() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();

        f.objects
            .create_folder(&user("u1"), "b", "a/b/c")
            .await
            .unwrap();
        f.objects
            .create_folder(&user("u1"), "b", "a/b/c")
            .await
            .unwrap();

        let items = f.objects.browse(&user("u1"), "b", "a/b").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "c");
    }

    #[tokio::test]
    async fn test_download_missing_or_folder() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        f.objects.create_folder(&user("u1"), "b", "dir").await.unwrap();

        for path in ["missing.txt", "dir", ""] {
            let err = f.objects.download(&user("u1"), "b", path).await.unwrap_err();
            assert_eq!(err.kind(), Kind::NotFound, "{path}");
        }
    }

    #[tokio::test]
    async fn test_delete_file_and_folder() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        put(&f, "", "top.txt", b"t").await;
        put(&f, "dir/sub", "inner.txt", b"i").await;

        f.objects
            .delete_item(&user("u1"), "b", "top.txt")
            .await
            .unwrap();
        f.objects.delete_item(&user("u1"), "b", "dir").await.unwrap();
        assert!(f.objects.browse(&user("u1"), "b", "").await.unwrap().is_empty());

        let err = f
            .objects
            .delete_item(&user("u1"), "b", "top.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);

        let err = f.objects.delete_item(&user("u1"), "b", "").await.unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidInput);
    }

    #[tokio::test]
    async fn test_rename() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        put(&f, "", "old.txt", b"data").await;

        f.objects
            .rename(&user("u1"), "b", "old.txt", "moved/new.txt")
            .await
            .unwrap();

        let (_, size) = f
            .objects
            .download(&user("u1"), "b", "moved/new.txt")
            .await
            .unwrap();
        assert_eq!(size, 4);

        let err = f
            .objects
            .rename(&user("u1"), "b", "old.txt", "x.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_onto_existing_conflicts() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        put(&f, "", "a.txt", b"aaa").await;
        put(&f, "", "b.txt", b"bbbbb").await;

        let err = f
            .objects
            .rename(&user("u1"), "b", "a.txt", "b.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Conflict);

        let (_, a) = f.objects.download(&user("u1"), "b", "a.txt").await.unwrap();
        let (_, b) = f.objects.download(&user("u1"), "b", "b.txt").await.unwrap();
        assert_eq!((a, b), (3, 5));
    }

    #[tokio::test]
    async fn test_rename_rejects_root_and_self_nesting() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        f.objects.create_folder(&user("u1"), "b", "dir").await.unwrap();

        let err = f
            .objects
            .rename(&user("u1"), "b", "dir", "dir/inner")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidInput);

        let err = f.objects.rename(&user("u1"), "b", "", "x").await.unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidInput);

        let err = f
            .objects
            .rename(&user("u1"), "b", "dir", "../escape")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Forbidden);
    }

    #[tokio::test]
    async fn test_usage() {
        let f = fixture();
        f.registry.create(&user("u1"), "b", None).await.unwrap();
        f.registry.create(&user("u1"), "empty", None).await.unwrap();
        put(&f, "", "a", b"12345").await;
        put(&f, "d", "b", b"123").await;

        let usage = f.objects.usage(&user("u1")).await.unwrap();
        assert_eq!(
            usage,
            StorageUsage {
                buckets: 2,
                files: 2,
                folders: 1,
                bytes: 8,
            }
        );
        assert_eq!(f.objects.usage(&user("u2")).await.unwrap().buckets, 0);
    }
}
