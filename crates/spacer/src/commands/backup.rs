//! Backup command
//!
//! Runs exactly one dump, encrypt and upload cycle.

use anyhow::{Context, Result};
use camino::Utf8Path;

use crate::output;

pub async fn run(env_file: Option<&Utf8Path>) -> Result<()> {
    output::header("Backup Database");

    let config = super::load_config(env_file)?;
    output::kv("Database", &config.database.database);
    output::kv("Bucket", &config.store.bucket);
    output::kv("Folder", &config.backup.folder);
    println!();

    let orchestrator = super::build_orchestrator(&config).await?;
    let report = orchestrator
        .run_cycle()
        .await
        .context("Backup cycle failed")?;

    output::success("Backup uploaded");
    output::kv("Snapshot", &report.artifact);
    output::kv("Key", &report.key);
    output::kv("URL", &report.url);
    output::kv("Dump size", &output::format_bytes(report.plaintext_bytes as u64));
    output::kv("Uploaded", &output::format_bytes(report.payload_bytes as u64));
    output::kv("Duration", &format!("{:.1}s", report.elapsed.as_secs_f64()));

    Ok(())
}
