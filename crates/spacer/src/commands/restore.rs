//! Restore command
//!
//! Connects the CLI to the spacer-backup restore path: select a snapshot,
//! download it, decrypt it and write the plaintext dump locally.

use anyhow::{bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use spacer_backup::{folder_key, Restorer, SelectionPolicy};

use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Which snapshot to restore (defaults to RESTORE_POLICY)
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Directory for the restored dump (defaults to DUMP_DIR)
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Snapshot with the earliest modification time
    Oldest,

    /// Snapshot with the latest modification time
    Newest,
}

impl PolicyArg {
    fn to_lib_policy(self) -> SelectionPolicy {
        match self {
            PolicyArg::Oldest => SelectionPolicy::Oldest,
            PolicyArg::Newest => SelectionPolicy::Newest,
        }
    }
}

pub async fn run(args: RestoreArgs, env_file: Option<&Utf8Path>) -> Result<()> {
    output::header("Restore Snapshot");

    let config = super::load_restore_config(env_file)?;
    let policy = args
        .policy
        .map(PolicyArg::to_lib_policy)
        .unwrap_or(config.restore_policy);
    let output_dir = args
        .output
        .map(Utf8PathBuf::into_std_path_buf)
        .unwrap_or_else(|| config.dump_dir.clone());
    let listing_prefix = folder_key(&config.folder, &config.prefix);

    output::kv("Source", &format!("s3://{}/{}", config.store.bucket, listing_prefix));
    output::kv("Policy", &policy.to_string());
    output::kv("Output", &output_dir.display().to_string());
    println!();

    let cipher = super::build_cipher(config.encrypt_key()?)?;
    let store = super::connect_store(&config.store).await?;
    let restorer = Restorer::new(store, cipher);

    let restored = match restorer
        .restore_latest(&config.folder, &config.prefix, policy)
        .await
    {
        Ok(restored) => restored,
        Err(e) if e.is_not_found() => bail!("No snapshots found under {}", listing_prefix),
        Err(e) => return Err(e).context("Restore failed"),
    };

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let artifact = restored
        .write_to(&output_dir, &config.prefix)
        .await
        .context("Failed to write restored dump")?;

    output::success("Snapshot restored");
    output::kv("Object", &restored.object.key);
    output::kv("Modified", &restored.object.last_modified.to_rfc3339());
    output::kv("Size", &output::format_bytes(restored.plaintext.len() as u64));
    output::kv("Path", &artifact.path().display().to_string());

    Ok(())
}
