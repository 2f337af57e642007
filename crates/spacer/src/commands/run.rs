//! Run command
//!
//! Starts the backup worker and keeps it running until a termination signal
//! arrives or a cycle fails.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{error, info, warn};

/// How long a stopping worker gets to wind down its current cycle
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn run(env_file: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(env_file)?;
    let orchestrator = Arc::new(super::build_orchestrator(&config).await?);

    info!(
        "Starting backups of {} to s3://{}/{} every {:?}",
        config.database.database,
        config.store.bucket,
        config.backup.folder,
        config.backup.interval
    );

    let mut worker = orchestrator.clone().spawn();

    tokio::select! {
        outcome = &mut worker => return finish(outcome),
        signal = shutdown_signal() => {
            info!("Received {}, stopping backup worker", signal?);
        }
    }

    orchestrator.shutdown();
    match tokio::time::timeout(SHUTDOWN_GRACE, worker).await {
        Ok(outcome) => finish(outcome),
        Err(_) => {
            warn!(
                "Backup worker did not stop within {:?}, exiting anyway",
                SHUTDOWN_GRACE
            );
            Ok(())
        }
    }
}

fn finish(outcome: std::result::Result<spacer_backup::Result<()>, JoinError>) -> Result<()> {
    match outcome.context("Backup worker panicked")? {
        Ok(()) => {
            info!("Backup worker stopped");
            Ok(())
        }
        Err(e) => {
            error!("Backup cycle failed: {}", e);
            Err(e).context("Backup loop terminated")
        }
    }
}

/// Wait for SIGINT or SIGTERM and name the one received
async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for SIGINT")?;
                Ok("SIGINT")
            }
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        Ok("Ctrl-C")
    }
}
