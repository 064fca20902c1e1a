use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const API_KEY_COLUMNS: &str =
    "secret, owner_id, owner_email, owner_name, name, permissions, created_at, last_used_at";

const BUCKET_COLUMNS: &str = "owner_id, name, region, storage_root, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Nothing survives the store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn api_key_from_row(row: &Row<'_>) -> rusqlite::Result<ApiKey> {
    Ok(ApiKey {
        secret: row.get(0)?,
        owner_id: row.get(1)?,
        owner_email: row.get(2)?,
        owner_name: row.get(3)?,
        name: row.get(4)?,
        permissions: Permissions::from(row.get::<_, i64>(5)?),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        last_used_at: row
            .get::<_, Option<String>>(7)?
            .map(|s| parse_datetime(&s)),
    })
}

fn bucket_from_row(row: &Row<'_>) -> rusqlite::Result<Bucket> {
    Ok(Bucket {
        owner_id: row.get(0)?,
        name: row.get(1)?,
        region: row.get(2)?,
        storage_root: PathBuf::from(row.get::<_, String>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn map_insert_error(e: rusqlite::Error, what: &str) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(format!("{what} already exists"))
        }
        e => Error::from(e),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // API key operations

    fn create_api_key(&self, key: &ApiKey) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO api_keys (secret, owner_id, owner_email, owner_name, name, permissions, created_at, last_used_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    key.secret,
                    key.owner_id,
                    key.owner_email,
                    key.owner_name,
                    key.name,
                    i64::from(key.permissions),
                    format_datetime(&key.created_at),
                    key.last_used_at.as_ref().map(format_datetime),
                ],
            )
            .map_err(|e| map_insert_error(e, "API key"))?;
        Ok(())
    }

    fn get_api_key(&self, secret: &str) -> Result<Option<ApiKey>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {API_KEY_COLUMNS} FROM api_keys WHERE secret = ?1"),
            params![secret],
            api_key_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_api_keys_by_prefix(&self, prefix: &str, owner_id: Option<&str>) -> Result<Vec<ApiKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys
             WHERE substr(secret, 1, length(?1)) = ?1 AND (?2 IS NULL OR owner_id = ?2)
             ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![prefix, owner_id], api_key_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_api_keys(&self, owner_id: Option<&str>) -> Result<Vec<ApiKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys
             WHERE ?1 IS NULL OR owner_id = ?1 ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![owner_id], api_key_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_api_key(&self, secret: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM api_keys WHERE secret = ?1", params![secret])?;
        Ok(rows > 0)
    }

    fn update_api_key_last_used(&self, secret: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE api_keys SET last_used_at = ?1 WHERE secret = ?2",
            params![format_datetime(&Utc::now()), secret],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("API key"));
        }
        Ok(())
    }

    // Bucket operations

    fn create_bucket(&self, bucket: &Bucket) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO buckets (owner_id, name, region, storage_root, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    bucket.owner_id,
                    bucket.name,
                    bucket.region,
                    bucket.storage_root.to_string_lossy(),
                    format_datetime(&bucket.created_at),
                ],
            )
            .map_err(|e| map_insert_error(e, "Bucket"))?;
        Ok(())
    }

    fn get_bucket(&self, owner_id: &str, name: &str) -> Result<Option<Bucket>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {BUCKET_COLUMNS} FROM buckets WHERE owner_id = ?1 AND name = ?2"),
            params![owner_id, name],
            bucket_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_buckets(&self, owner_id: &str) -> Result<Vec<Bucket>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BUCKET_COLUMNS} FROM buckets WHERE owner_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![owner_id], bucket_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_bucket(&self, owner_id: &str, name: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM buckets WHERE owner_id = ?1 AND name = ?2",
            params![owner_id, name],
        )?;
        Ok(rows > 0)
    }
}
