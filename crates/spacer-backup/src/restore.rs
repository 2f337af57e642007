//! On-demand restore
//!
//! Lists snapshots under `<folder>/<prefix>`, selects one, downloads it from
//! its public URL and decrypts it. Errors are returned to the caller; a
//! restore never ends the process on its own.

use crate::cipher::Cipher;
use crate::error::{Error, Result, StoreError};
use crate::selector::{select_restore_target, SelectionPolicy};
use crate::store::{folder_key, ObjectStore};
use chrono::Local;
use spacer_core::{RemoteObject, SnapshotArtifact};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A decrypted snapshot and the object it came from
#[derive(Debug, Clone)]
pub struct RestoredSnapshot {
    pub object: RemoteObject,
    pub plaintext: Vec<u8>,
}

impl RestoredSnapshot {
    /// Write the plaintext dump as a new artifact in `dir`
    pub async fn write_to(&self, dir: &Path, prefix: &str) -> Result<SnapshotArtifact> {
        let artifact = SnapshotArtifact::new(dir, prefix, Local::now());
        tokio::fs::write(artifact.path(), &self.plaintext)
            .await
            .map_err(|e| Error::io(artifact.path(), e))?;
        Ok(artifact)
    }
}

/// Restore path over an object store
pub struct Restorer {
    store: Arc<dyn ObjectStore>,
    cipher: Cipher,
}

impl Restorer {
    pub fn new(store: Arc<dyn ObjectStore>, cipher: Cipher) -> Self {
        Self { store, cipher }
    }

    /// List `<folder>/<prefix>` and pick the object `policy` selects
    pub async fn latest_object(
        &self,
        folder: &str,
        prefix: &str,
        policy: SelectionPolicy,
    ) -> Result<RemoteObject> {
        let listing_prefix = folder_key(folder, prefix);
        let objects = self.store.list(&listing_prefix).await?;

        let selected = select_restore_target(&objects, policy)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                prefix: listing_prefix.clone(),
            })?;

        info!(
            "Selected {} ({} policy, {} candidates)",
            selected.key,
            policy,
            objects.len()
        );
        Ok(selected)
    }

    /// Select and download a snapshot, still encrypted
    pub async fn fetch_latest(
        &self,
        folder: &str,
        prefix: &str,
        policy: SelectionPolicy,
    ) -> Result<(RemoteObject, Vec<u8>)> {
        let object = self.latest_object(folder, prefix, policy).await?;
        let payload = self.store.fetch(&object.key).await?;
        Ok((object, payload))
    }

    /// Select, download and decrypt a snapshot
    pub async fn restore_latest(
        &self,
        folder: &str,
        prefix: &str,
        policy: SelectionPolicy,
    ) -> Result<RestoredSnapshot> {
        let (object, payload) = self.fetch_latest(folder, prefix, policy).await?;
        let plaintext = self.cipher.decrypt(&payload)?;

        info!(
            "Restored {} ({} bytes decrypted)",
            object.key,
            plaintext.len()
        );
        Ok(RestoredSnapshot { object, plaintext })
    }
}
