//! Pulse file upload

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::{Path, PathBuf};
use terastore_core::{format_file_size, process_upload_files, UploadBatch, UploadCandidate, UploadFile};
use tracing::{debug, info};

use crate::init::Backend;

#[derive(Args)]
pub struct UploadArgs {
    /// JSON files holding one pulse or an array of pulses
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Validate only, do not upload
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(backend: &Backend, args: UploadArgs, max_file_bytes: u64) -> Result<()> {
    let mut candidates = Vec::with_capacity(args.files.len());
    for path in &args.files {
        candidates.push(read_candidate(path, max_file_bytes).await?);
    }

    let devices = backend
        .client
        .list_devices()
        .await
        .context("Failed to load devices")?;
    let batch = process_upload_files(&[], candidates, &devices, max_file_bytes);
    report_denied(&batch);

    if batch.accepted.is_empty() {
        bail!("No valid files to upload");
    }

    let total: u64 = batch.accepted.iter().map(|f| f.size).sum();
    if args.dry_run {
        println!(
            "{} pulses in {} files ({}) are valid",
            batch.pulses.len(),
            batch.accepted.len(),
            format_file_size(total)
        );
        return Ok(());
    }

    let ids = backend.client.create_pulses(&batch.pulses).await?;
    backend.queries.clear();

    info!(pulses = ids.len(), files = batch.accepted.len(), "Uploaded pulses");
    println!(
        "Uploaded {} pulses from {} files ({})",
        ids.len(),
        batch.accepted.len(),
        format_file_size(total)
    );
    Ok(())
}

// Oversized files are not read; they are denied on size alone.
async fn read_candidate(path: &Path, max_file_bytes: u64) -> Result<UploadCandidate> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let file = UploadFile::new(name, metadata.len(), modified);

    let content = if file.size > max_file_bytes {
        String::new()
    } else {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    debug!(file = %file.name, size = file.size, "Read upload candidate");
    Ok(UploadCandidate { file, content })
}

fn report_denied(batch: &UploadBatch) {
    for (file, error) in &batch.denied {
        eprintln!("Could not parse {}: {}", file.name, error);
        if let Some(hint) = error.hint() {
            eprintln!("  hint: {}", hint);
        }
    }
}
