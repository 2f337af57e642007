//! Object store access
//!
//! Writes go through the authenticated S3 API. Reads fetch the object's
//! public URL with a plain GET, so restores assume a publicly readable
//! bucket.

mod spaces;

pub use spaces::SpacesStore;

use crate::error::StoreError;
use async_trait::async_trait;
use spacer_core::RemoteObject;

/// Bucket-style object store used by backup cycles and restores
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Public URL an object is served from
    fn object_url(&self, key: &str) -> String;

    /// Upload `body` under `key` and return its public URL.
    ///
    /// The URL does not depend on the upload outcome; a failed upload
    /// reports the same URL inside [`StoreError::Put`].
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, StoreError>;

    /// List every object whose key starts with `prefix`.
    ///
    /// An empty listing is [`StoreError::NotFound`], never an empty `Ok`.
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StoreError>;

    /// Download an object's bytes from its public URL
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Join a folder and a name into an object key
pub fn folder_key(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_key() {
        assert_eq!(folder_key("folder", "shop.dump.sql"), "folder/shop.dump.sql");
        assert_eq!(folder_key("folder/", "shop.dump.sql"), "folder/shop.dump.sql");
        assert_eq!(folder_key("", "shop.dump.sql"), "shop.dump.sql");
        assert_eq!(folder_key("nightly/db", "shop"), "nightly/db/shop");
    }
}
