use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Permissions;

pub const ADMIN_USER_ID: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@cloudx.local";
pub const ADMIN_DISPLAY_NAME: &str = "Administrator";

/// Length of the secret prefix exposed in listings.
pub const KEY_PREVIEW_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    #[serde(skip)]
    pub secret: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    pub name: String,
    pub permissions: Permissions,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Non-secret prefix of the key, e.g. `cx_1a2b3c4...`.
    #[must_use]
    pub fn preview(&self) -> String {
        let end = self
            .secret
            .char_indices()
            .nth(KEY_PREVIEW_LEN)
            .map_or(self.secret.len(), |(i, _)| i);
        format!("{}...", &self.secret[..end])
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.owner_id.clone(),
            email: self.owner_email.clone(),
            display_name: self.owner_name.clone(),
            is_admin: false,
            permissions: self.permissions,
        }
    }
}

/// The caller an operation runs on behalf of. Derived from a credential on
/// every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub is_admin: bool,
    #[serde(skip)]
    pub permissions: Permissions,
}

impl Identity {
    /// The fixed identity behind the master credential.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            user_id: ADMIN_USER_ID.to_string(),
            email: Some(ADMIN_EMAIL.to_string()),
            display_name: Some(ADMIN_DISPLAY_NAME.to_string()),
            is_admin: true,
            permissions: Permissions::ALL,
        }
    }

    /// A regular user identity with every capability, as carried by freshly
    /// issued keys.
    #[must_use]
    pub fn user(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            display_name: None,
            is_admin: false,
            permissions: Permissions::ALL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub owner_id: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub storage_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// A directory entry inside a bucket, read from the filesystem at listing time.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Aggregate usage of one owner's buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub buckets: u64,
    pub files: u64,
    pub folders: u64,
    pub bytes: u64,
}
