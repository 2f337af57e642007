//! Backup cycle orchestration
//!
//! One cycle is dump → read → encrypt → write payload → upload → delete the
//! local artifact. [`Orchestrator::run`] repeats cycles with a pause between
//! them and stops at the first failed cycle, returning the error to the
//! caller. There is no retry and no backoff; restarting is left to whatever
//! supervises the process.
//!
//! Cycles never overlap: a single loop runs each cycle, including the
//! pause, to completion before starting the next one.

use crate::cipher::Cipher;
use crate::error::{Error, Result, Stage};
use crate::producer::DumpProducer;
use crate::store::{folder_key, ObjectStore};
use chrono::Local;
use spacer_core::{BackupSettings, SnapshotArtifact};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Deadline shared by the dump and upload of one cycle
pub const CYCLE_DEADLINE: Duration = Duration::from_secs(30);

/// Orchestrator state; there is no failed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// Naming, location and timing of backup cycles
#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Artifact name prefix
    pub prefix: String,
    /// Remote folder objects are uploaded under
    pub folder: String,
    /// Local directory for dump files
    pub dump_dir: PathBuf,
    /// Pause between cycles
    pub interval: Duration,
    /// Budget for dump plus upload
    pub deadline: Duration,
}

impl From<&BackupSettings> for CycleSettings {
    fn from(settings: &BackupSettings) -> Self {
        Self {
            prefix: settings.prefix.clone(),
            folder: settings.folder.clone(),
            dump_dir: settings.dump_dir.clone(),
            interval: settings.interval,
            deadline: CYCLE_DEADLINE,
        }
    }
}

/// Outcome of a successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Local artifact name
    pub artifact: String,
    /// Object key the payload was stored under
    pub key: String,
    /// Public URL of the stored object
    pub url: String,
    pub plaintext_bytes: usize,
    pub payload_bytes: usize,
    pub elapsed: Duration,
}

/// Drives backup cycles on a timer
pub struct Orchestrator {
    producer: Arc<dyn DumpProducer>,
    cipher: Cipher,
    store: Arc<dyn ObjectStore>,
    settings: CycleSettings,
    cancel: CancellationToken,
    state: watch::Sender<CycleState>,
}

impl Orchestrator {
    pub fn new(
        producer: Arc<dyn DumpProducer>,
        cipher: Cipher,
        store: Arc<dyn ObjectStore>,
        settings: CycleSettings,
    ) -> Self {
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            producer,
            cipher,
            store,
            settings,
            cancel: CancellationToken::new(),
            state,
        }
    }

    /// Observe `Idle` / `Running` transitions
    pub fn state(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Token observed by every in-flight step
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask the loop to stop; in-flight steps return [`Error::Cancelled`]
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Start the single background worker
    pub fn spawn(self: Arc<Self>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run cycles until one fails or shutdown is requested.
    ///
    /// A failed cycle ends the loop with its error. Shutdown ends it with
    /// `Ok(())`.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Backup loop started (interval {:?}, folder {:?})",
            self.settings.interval, self.settings.folder
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    "Dump exported to {} ({} -> {} bytes in {:?})",
                    report.url, report.plaintext_bytes, report.payload_bytes, report.elapsed
                ),
                Err(Error::Cancelled) => {
                    info!("Backup loop cancelled during a cycle");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Backup loop stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
    }

    /// Run exactly one backup cycle
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.state.send_replace(CycleState::Running);
        let result = self.execute_cycle().await;
        self.state.send_replace(CycleState::Idle);
        result
    }

    async fn execute_cycle(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let deadline = started + self.settings.deadline;
        let artifact =
            SnapshotArtifact::new(&self.settings.dump_dir, &self.settings.prefix, Local::now());

        info!("Starting backup cycle for {}", artifact.name());

        match self.ship(&artifact, deadline).await {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                if let Err(e) = tokio::fs::remove_file(artifact.path()).await {
                    warn!(
                        "Failed to delete dump file {}: {}",
                        artifact.path().display(),
                        e
                    );
                }
                Ok(report)
            }
            Err(e) => {
                discard(&artifact).await;
                Err(e)
            }
        }
    }

    async fn ship(&self, artifact: &SnapshotArtifact, deadline: Instant) -> Result<CycleReport> {
        let path = artifact.path();

        self.guarded(Stage::Dump, deadline, self.producer.dump(path))
            .await?;

        let plaintext = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(path, e))?;
        debug!("Read {} bytes from {}", plaintext.len(), path.display());

        let payload = self.cipher.encrypt(&plaintext)?;
        payload
            .write_to(path)
            .await
            .map_err(|e| Error::io(path, e))?;

        let key = folder_key(&self.settings.folder, artifact.name());
        let payload_bytes = payload.len();
        let url = self
            .guarded(
                Stage::Upload,
                deadline,
                self.store.put(&key, payload.into_bytes()),
            )
            .await?;

        Ok(CycleReport {
            artifact: artifact.name().to_string(),
            key,
            url,
            plaintext_bytes: plaintext.len(),
            payload_bytes,
            elapsed: Duration::ZERO,
        })
    }

    /// Await `fut` unless the cycle deadline passes or shutdown is requested
    async fn guarded<T, E, F>(&self, stage: Stage, deadline: Instant, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        Error: From<E>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            outcome = tokio::time::timeout_at(deadline, fut) => match outcome {
                Ok(result) => result.map_err(Error::from),
                Err(_) => Err(Error::DeadlineExceeded {
                    stage,
                    deadline: self.settings.deadline,
                }),
            },
        }
    }
}

/// Remove a leftover artifact after a failed cycle
async fn discard(artifact: &SnapshotArtifact) {
    match tokio::fs::remove_file(artifact.path()).await {
        Ok(()) => debug!("Removed partial dump {}", artifact.path().display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to remove partial dump {}: {}",
            artifact.path().display(),
            e
        ),
    }
}
