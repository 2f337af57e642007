//! Spacer backup engine
//!
//! Periodic, encrypted database snapshots shipped to S3-compatible object
//! storage, and the restore path that brings them back.
//!
//! # Features
//!
//! - **Cipher**: AES-CFB over the base64 text of the dump, random IV prefix
//! - **Object store**: authenticated uploads and listings, public downloads
//! - **Selection**: explicit oldest/newest restore policy
//! - **Orchestration**: dump → encrypt → upload → cleanup on a timer, with a
//!   per-cycle deadline and cooperative shutdown
//!
//! # Examples
//!
//! ```no_run
//! use spacer_backup::{Cipher, CycleSettings, Orchestrator, PgDumpProducer, SpacesStore};
//! use spacer_core::SpacerConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SpacerConfig::from_env()?;
//!     let cipher = Cipher::new(&config.encrypt_key)?;
//!     let store = SpacesStore::new(&config.store).await?;
//!
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(PgDumpProducer::new(config.database.clone())),
//!         cipher,
//!         Arc::new(store),
//!         CycleSettings::from(&config.backup),
//!     );
//!
//!     let report = orchestrator.run_cycle().await?;
//!     println!("Uploaded {}", report.url);
//!     Ok(())
//! }
//! ```

pub mod cipher;
pub mod error;
pub mod orchestrator;
pub mod producer;
pub mod restore;
pub mod selector;
pub mod store;

// Re-export commonly used types
pub use cipher::{Cipher, EncryptedPayload, BLOCK_SIZE};
pub use error::{CryptoError, Error, ProducerError, Result, Stage, StoreError};
pub use orchestrator::{CycleReport, CycleSettings, CycleState, Orchestrator, CYCLE_DEADLINE};
pub use producer::{DumpProducer, PgDumpProducer};
pub use restore::{RestoredSnapshot, Restorer};
pub use selector::{select_restore_target, SelectionPolicy};
pub use store::{folder_key, ObjectStore, SpacesStore};
