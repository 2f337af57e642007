//! Error types for spacer-backup

use spacer_core::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using spacer-backup's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Cipher construction and payload framing errors
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key is not a valid AES key size
    #[error("Invalid key length: {len} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength { len: usize },

    /// Payload is too short to carry an IV
    #[error("Ciphertext too short: {len} bytes, need at least {min}")]
    Framing { len: usize, min: usize },

    /// Decrypted text is not base64
    #[error("Decrypted payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Object store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Upload failed; `url` is where the object would have been served
    #[error("Failed to upload {key} ({url}): {detail}")]
    Put {
        key: String,
        url: String,
        detail: String,
    },

    /// Listing request failed
    #[error("Failed to list objects under {prefix:?}: {detail}")]
    List { prefix: String, detail: String },

    /// Listing succeeded but returned nothing
    #[error("No objects found under prefix {prefix:?}")]
    NotFound { prefix: String },

    /// Public download failed
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Client could not be built
    #[error("Invalid store client configuration: {message}")]
    Client { message: String },
}

/// Dump producer errors
#[derive(Error, Debug)]
pub enum ProducerError {
    /// Dump tool could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Dump tool ran and reported failure
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

impl ProducerError {
    /// Create a failed-run error
    pub fn failed(
        program: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Failed {
            program: program.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }
}

/// Cycle step that can run past the deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dump,
    Upload,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Dump => write!(f, "dump"),
            Stage::Upload => write!(f, "upload"),
        }
    }
}

/// Errors surfaced by backup cycles and restores
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dump failed: {0}")]
    Producer(#[from] ProducerError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The per-cycle deadline expired
    #[error("Deadline of {deadline:?} exceeded during {stage}")]
    DeadlineExceeded { stage: Stage, deadline: Duration },

    /// Shutdown was requested while work was in flight
    #[error("Cancelled by shutdown request")]
    Cancelled,
}

impl Error {
    /// Create an IO error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for an empty listing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::NotFound { .. }))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
