//! # spacer-core
//!
//! Core library for spacer providing:
//! - Configuration loading from `.env` files and the process environment
//! - Backup interval parsing
//! - Shared types: credentials, remote objects, snapshot artifacts

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    load_env_file, parse_interval, BackupSettings, DatabaseConfig, RestoreConfig, SpacerConfig,
    StoreConfig,
};
pub use error::{ConfigError, Result};
pub use types::{Credentials, RemoteObject, SelectionPolicy, SnapshotArtifact};
