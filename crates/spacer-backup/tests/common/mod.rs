//! Shared test helpers
//!
//! In-memory doubles for the object store and the dump producer, so cycle
//! and restore behaviour can be exercised without a database or network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spacer_backup::{DumpProducer, ObjectStore, ProducerError, StoreError};
use spacer_core::RemoteObject;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 16 zero bytes, an AES-128 key
pub const ZERO_KEY: [u8; 16] = [0u8; 16];

pub const TEST_BUCKET: &str = "backups";
pub const TEST_HOST: &str = "storage.example.net";

/// Record of one `put` call
#[derive(Clone, Debug)]
pub struct PutRecord {
    pub key: String,
    pub body: Vec<u8>,
}

/// Object store double backed by a map
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, DateTime<Utc>)>>,
    puts: Mutex<Vec<PutRecord>>,
    fail_puts: Mutex<bool>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an object with a fixed timestamp (Unix seconds)
    pub fn insert(&self, key: &str, body: Vec<u8>, modified_secs: i64) {
        let at = DateTime::<Utc>::from_timestamp(modified_secs, 0).unwrap();
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, at));
    }

    /// Make every subsequent `put` fail
    pub fn fail_puts(&self) {
        *self.fail_puts.lock().unwrap() = true;
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn object_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", TEST_BUCKET, TEST_HOST, key)
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, StoreError> {
        let url = self.object_url(key);
        self.puts.lock().unwrap().push(PutRecord {
            key: key.to_string(),
            body: body.clone(),
        });

        if *self.fail_puts.lock().unwrap() {
            return Err(StoreError::Put {
                key: key.to_string(),
                url,
                detail: "AccessDenied".to_string(),
            });
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, Utc::now()));
        Ok(url)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StoreError> {
        let mut objects: Vec<RemoteObject> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (body, at))| RemoteObject::new(key.clone(), *at).with_size(body.len() as u64))
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        if objects.is_empty() {
            return Err(StoreError::NotFound {
                prefix: prefix.to_string(),
            });
        }
        Ok(objects)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(body, _)| body.clone())
            .ok_or_else(|| StoreError::NotFound {
                prefix: key.to_string(),
            })
    }
}

/// What a scripted producer does when asked for a dump
#[derive(Clone, Debug)]
pub enum DumpBehavior {
    /// Write these bytes to the output path
    Write(Vec<u8>),
    /// Fail without writing anything
    Fail(String),
    /// Write the bytes after a delay
    Slow(Duration, Vec<u8>),
}

/// Dump producer double that records the paths it was asked to write
pub struct ScriptedProducer {
    behavior: DumpBehavior,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedProducer {
    pub fn new(behavior: DumpBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn writing(bytes: &[u8]) -> Arc<Self> {
        Self::new(DumpBehavior::Write(bytes.to_vec()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(DumpBehavior::Fail(message.to_string()))
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DumpProducer for ScriptedProducer {
    async fn dump(&self, output: &Path) -> Result<(), ProducerError> {
        self.calls.lock().unwrap().push(output.to_path_buf());

        match &self.behavior {
            DumpBehavior::Write(bytes) => {
                tokio::fs::write(output, bytes).await.unwrap();
                Ok(())
            }
            DumpBehavior::Fail(message) => Err(ProducerError::failed(
                "pg_dump",
                "exit status: 1",
                message.clone(),
            )),
            DumpBehavior::Slow(delay, bytes) => {
                tokio::time::sleep(*delay).await;
                tokio::fs::write(output, bytes).await.unwrap();
                Ok(())
            }
        }
    }
}

/// Files left in a directory
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
