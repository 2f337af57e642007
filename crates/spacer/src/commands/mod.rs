//! CLI command implementations

pub mod backup;
pub mod list;
pub mod restore;
pub mod run;

use anyhow::{Context, Result};
use camino::Utf8Path;
use spacer_backup::{Cipher, CycleSettings, Orchestrator, PgDumpProducer, SpacesStore};
use spacer_core::{load_env_file, RestoreConfig, SpacerConfig, StoreConfig};
use std::sync::Arc;

/// Merge the env file into the process environment and read the full configuration
pub(crate) fn load_config(env_file: Option<&Utf8Path>) -> Result<SpacerConfig> {
    load_env_file(env_file.map(Utf8Path::as_std_path)).context("Failed to load env file")?;
    SpacerConfig::from_env().context("Invalid configuration")
}

/// Store-side configuration only, for commands that never dump
pub(crate) fn load_restore_config(env_file: Option<&Utf8Path>) -> Result<RestoreConfig> {
    load_env_file(env_file.map(Utf8Path::as_std_path)).context("Failed to load env file")?;
    RestoreConfig::from_env().context("Invalid configuration")
}

/// Cipher for the configured key; an unusable key stops the command before any I/O
pub(crate) fn build_cipher(key: &[u8]) -> Result<Cipher> {
    Cipher::new(key).context("ENCRYPT_KEY is not a valid AES key")
}

pub(crate) async fn connect_store(config: &StoreConfig) -> Result<Arc<SpacesStore>> {
    let store = SpacesStore::new(config)
        .await
        .with_context(|| format!("Failed to configure store client for {}", config.endpoint))?;
    Ok(Arc::new(store))
}

/// Wire the dump producer, cipher and store into an orchestrator
pub(crate) async fn build_orchestrator(config: &SpacerConfig) -> Result<Orchestrator> {
    let cipher = build_cipher(&config.encrypt_key)?;
    let store = connect_store(&config.store).await?;

    tokio::fs::create_dir_all(&config.backup.dump_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create dump directory {}",
                config.backup.dump_dir.display()
            )
        })?;

    Ok(Orchestrator::new(
        Arc::new(PgDumpProducer::new(config.database.clone())),
        cipher,
        store,
        CycleSettings::from(&config.backup),
    ))
}
