//! Database dump producers

use crate::error::ProducerError;
use async_trait::async_trait;
use spacer_core::DatabaseConfig;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Something that writes a database dump to a local file
#[async_trait]
pub trait DumpProducer: Send + Sync {
    /// Write a complete dump to `output`
    async fn dump(&self, output: &Path) -> Result<(), ProducerError>;
}

/// Dump producer backed by `pg_dump`
///
/// The child is killed when the dump future is dropped, so a cycle that
/// hits its deadline or is cancelled does not leave `pg_dump` running.
#[derive(Debug, Clone)]
pub struct PgDumpProducer {
    config: DatabaseConfig,
}

impl PgDumpProducer {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn command(&self, output: &Path) -> Command {
        let mut command = Command::new(&self.config.pg_dump_path);
        command
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(&self.config.port)
            .arg("--username")
            .arg(&self.config.user)
            .arg("--dbname")
            .arg(&self.config.database)
            .arg("--no-password")
            .arg("--file")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(password) = &self.config.password {
            command.env("PGPASSWORD", password.as_str());
        }
        command
    }
}

#[async_trait]
impl DumpProducer for PgDumpProducer {
    async fn dump(&self, output: &Path) -> Result<(), ProducerError> {
        let program = self.config.pg_dump_path.clone();
        debug!(
            "Running {} for {}@{}:{}/{} into {}",
            program,
            self.config.user,
            self.config.host,
            self.config.port,
            self.config.database,
            output.display()
        );

        let result = self
            .command(output)
            .output()
            .await
            .map_err(|source| ProducerError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ProducerError::failed(
                program,
                result.status.to_string(),
                String::from_utf8_lossy(&result.stderr).trim(),
            ));
        }

        Ok(())
    }
}
