//! # CloudX
//!
//! A multi-tenant bucket storage server with API-key authentication, usable
//! both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! cloudx = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cloudx::config::ServerConfig;
//! use cloudx::server::{AppState, create_router};
//!
//! let config = ServerConfig::default();
//! let state = Arc::new(AppState::from_config(&config).unwrap());
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! The pieces are also usable on their own: [`auth::KeyStore`] issues and
//! validates keys, [`storage::BucketRegistry`] owns the bucket catalog and
//! [`storage::ObjectStore`] works on files inside a bucket. All of them
//! share one [`store::Store`].
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `cloudx` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod store;
pub mod types;
