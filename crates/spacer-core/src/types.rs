//! Shared domain types

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Timestamp layout embedded in snapshot file names
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Access key / secret key pair for the object store
///
/// Immutable once built. The secret half is zeroed on drop and never
/// printed by `Debug`.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: Zeroizing<String>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: Zeroizing::new(secret_key.into()),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.as_str()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// One object returned by a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Full object key, including the folder prefix
    pub key: String,
    /// Last-modified timestamp reported by the store
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes
    #[serde(default)]
    pub size: u64,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size: 0,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Key without its folder component
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Which listed object a restore picks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Minimum last-modified timestamp
    #[default]
    Oldest,
    /// Maximum last-modified timestamp
    Newest,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::Oldest => write!(f, "oldest"),
            SelectionPolicy::Newest => write!(f, "newest"),
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" => Ok(SelectionPolicy::Oldest),
            "newest" => Ok(SelectionPolicy::Newest),
            other => Err(format!(
                "unknown selection policy {:?}, expected \"oldest\" or \"newest\"",
                other
            )),
        }
    }
}

/// A local database dump produced for one backup cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    name: String,
    path: PathBuf,
    created_at: DateTime<Local>,
}

impl SnapshotArtifact {
    /// Describe a new artifact named `<prefix>.dump_<timestamp>.sql` inside `dir`.
    ///
    /// Nothing is written to disk; the dump producer materializes the file.
    pub fn new(dir: &Path, prefix: &str, created_at: DateTime<Local>) -> Self {
        let name = Self::file_name(prefix, created_at);
        Self {
            path: dir.join(&name),
            name,
            created_at,
        }
    }

    /// Build the artifact file name for a prefix and creation time
    pub fn file_name(prefix: &str, created_at: DateTime<Local>) -> String {
        format!(
            "{}.dump_{}.sql",
            prefix,
            created_at.format(SNAPSHOT_TIMESTAMP_FORMAT)
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}
