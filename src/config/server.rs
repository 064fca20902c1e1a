use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::storage::{DEFAULT_REGION, MAX_UPLOAD_SIZE};

pub const DEFAULT_MASTER_KEY: &str = "cloudx-admin-2024-secure-key";

/// Environment variables consulted for the master credential, in order.
pub const MASTER_KEY_ENV: [&str; 2] = ["CLOUDX_MASTER_KEY", "MASTER_KEY"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Static credential that always resolves to the admin identity.
    pub master_key: String,
    /// Region recorded for buckets created without one.
    pub default_region: String,
    pub max_upload_bytes: u64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Overrides the master key from the environment, if set.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(key) = MASTER_KEY_ENV
            .iter()
            .find_map(|name| std::env::var(name).ok())
        {
            self.master_key = key;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.master_key.trim().is_empty() {
            return Err(Error::Config("master key cannot be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn uses_default_master_key(&self) -> bool {
        self.master_key == DEFAULT_MASTER_KEY
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("cloudx.db")
    }

    #[must_use]
    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    #[must_use]
    pub fn tmp_dir(&self) -> PathBuf {
        self.data_dir.join("tmp")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("./data"),
            master_key: DEFAULT_MASTER_KEY.to_string(),
            default_region: DEFAULT_REGION.to_string(),
            max_upload_bytes: MAX_UPLOAD_SIZE,
        }
    }
}
