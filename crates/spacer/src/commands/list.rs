//! List command

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Args;
use spacer_backup::{folder_key, ObjectStore, StoreError};

use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Artifact name prefix to list (defaults to PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ListArgs, env_file: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_restore_config(env_file)?;
    let store = super::connect_store(&config.store).await?;

    let prefix = args.prefix.as_deref().unwrap_or(&config.prefix);
    let listing_prefix = folder_key(&config.folder, prefix);

    let mut objects = match store.list(&listing_prefix).await {
        Ok(objects) => objects,
        Err(StoreError::NotFound { .. }) => Vec::new(),
        Err(e) => return Err(e).context("Failed to list snapshots"),
    };
    objects.sort_by(|a, b| a.last_modified.cmp(&b.last_modified));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    if objects.is_empty() {
        output::info(&format!("No snapshots found under {}", listing_prefix));
        return Ok(());
    }

    output::header(&format!("Snapshots under s3://{}/{}", config.store.bucket, listing_prefix));
    for object in &objects {
        println!(
            "  {}  {:>10}  {}",
            object.last_modified.format("%Y-%m-%d %H:%M:%S"),
            output::format_bytes(object.size),
            object.key
        );
    }
    println!();
    output::kv("Total", &objects.len().to_string());

    Ok(())
}
