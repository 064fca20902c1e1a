use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApiKey, Bucket, Item};

#[derive(Debug, Default, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateKeyResponse {
    pub secret: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub name: String,
    pub permissions: Vec<&'static str>,
    pub message: &'static str,
}

impl From<ApiKey> for CreateKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            permissions: key.permissions.to_strings(),
            secret: key.secret,
            owner_id: key.owner_id,
            name: key.name,
            message: "Store this key securely - it will not be shown again",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KeyResponse {
    #[serde(rename = "namePreview")]
    pub preview: String,
    pub name: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub permissions: Vec<&'static str>,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastUsed")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for KeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            preview: key.preview(),
            permissions: key.permissions.to_strings(),
            name: key.name,
            owner_id: key.owner_id,
            created_at: key.created_at,
            last_used_at: key.last_used_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BucketResponse {
    pub name: String,
    pub region: String,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

impl From<Bucket> for BucketResponse {
    fn from(bucket: Bucket) -> Self {
        Self {
            name: bucket.name,
            region: bucket.region,
            created_at: bucket.created_at,
        }
    }
}

/// Buckets keyed by name.
pub type BucketListResponse = BTreeMap<String, BucketResponse>;

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default, alias = "folderPath")]
    pub folder_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderParams {
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemRequest {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default, alias = "oldPath")]
    pub old_path: Option<String>,
    #[serde(default, alias = "newPath")]
    pub new_path: Option<String>,
}

/// Returns the value as given, or None if absent or empty.
#[must_use]
pub fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
