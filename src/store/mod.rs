mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store is the durable record store behind the key and bucket catalogs.
///
/// Implementations serialize mutations behind a single lock and commit each
/// one before returning. Check-then-insert sequences in callers are not
/// atomic; a concurrent duplicate insert surfaces as `Error::Conflict` from
/// the `create_*` call that loses.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // API key operations
    fn create_api_key(&self, key: &ApiKey) -> Result<()>;
    fn get_api_key(&self, secret: &str) -> Result<Option<ApiKey>>;
    /// Keys whose secret starts with `prefix`, limited to one owner unless
    /// `owner_id` is `None`.
    fn find_api_keys_by_prefix(&self, prefix: &str, owner_id: Option<&str>) -> Result<Vec<ApiKey>>;
    /// Lists keys for one owner, or every key when `owner_id` is `None`.
    fn list_api_keys(&self, owner_id: Option<&str>) -> Result<Vec<ApiKey>>;
    fn delete_api_key(&self, secret: &str) -> Result<bool>;
    fn update_api_key_last_used(&self, secret: &str) -> Result<()>;

    // Bucket operations
    fn create_bucket(&self, bucket: &Bucket) -> Result<()>;
    fn get_bucket(&self, owner_id: &str, name: &str) -> Result<Option<Bucket>>;
    fn list_buckets(&self, owner_id: &str) -> Result<Vec<Bucket>>;
    fn delete_bucket(&self, owner_id: &str, name: &str) -> Result<bool>;
}
