//! Read-only pulse queries: keys, values, counts, recommendations, downloads.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use terastore_client::{CachedQueries, ReqwestHttpClient};
use terastore_core::{AnnotatedPulse, AttrKey, FilterResult, Pulse};
use terastore_filters::{Explorer, KeyOptions};
use tracing::{info, warn};

use super::filter_args::{resolve_filters, FilterArg};
use crate::init::Backend;

type QueryExplorer = Explorer<Arc<CachedQueries<ReqwestHttpClient>>>;

#[derive(Args)]
pub struct FilterArgs {
    /// Filter as key=value, key=lo..hi or date=YYYY-MM-DD..YYYY-MM-DD (repeatable)
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<FilterArg>,
}

#[derive(Args)]
pub struct ValuesArgs {
    /// Attribute key to inspect
    pub key: String,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Write to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Explorer over the cached queries with `args` applied.
async fn explorer(backend: &Backend, args: &FilterArgs) -> Result<QueryExplorer> {
    let explorer = Explorer::new(backend.queries.clone());
    explorer
        .fetch_initial_state()
        .await
        .context("Failed to load attribute keys")?;

    let keys = explorer.candidate_keys().unwrap_or_default();
    for filter in resolve_filters(&args.filters, &keys)? {
        explorer.add_filter(filter);
    }
    Ok(explorer)
}

pub async fn keys(backend: &Backend) -> Result<()> {
    let explorer = explorer(backend, &FilterArgs { filters: Vec::new() }).await?;
    for key in explorer.candidate_keys().unwrap_or_default() {
        println!("{}\t{}", key.name(), key.kind().as_str());
    }
    Ok(())
}

pub async fn values(backend: &Backend, args: ValuesArgs) -> Result<()> {
    let explorer = explorer(backend, &args.filters).await?;
    let key = find_key(&explorer, &args.key)?;

    let Some(options) = explorer.select_key(key).await? else {
        bail!("Selection of '{}' was superseded", args.key);
    };

    match options {
        KeyOptions::Values(results) => {
            for result in results {
                print_value_count(&result);
            }
        }
        KeyOptions::NumberRange(Some((lower, upper))) => println!("{}..{}", lower, upper),
        KeyOptions::DateRange(Some((lower, upper))) => {
            println!("{}..{}", lower.format("%Y-%m-%d"), upper.format("%Y-%m-%d"))
        }
        KeyOptions::NumberRange(None) | KeyOptions::DateRange(None) => {
            warn!(key = %args.key, "No values under the current filters");
        }
    }
    Ok(())
}

fn print_value_count(result: &FilterResult) {
    if let Some(filter) = result.last_filter() {
        println!("{}\t{}", result.count(), filter.display_value());
    }
}

fn find_key(explorer: &QueryExplorer, name: &str) -> Result<AttrKey> {
    let snapshot = explorer.snapshot();
    let applied = snapshot.applied.iter().map(|f| f.key().clone());
    snapshot
        .candidates
        .unwrap_or_default()
        .into_iter()
        .chain(applied)
        .find(|k| k.name() == name)
        .with_context(|| format!("Unknown attribute key '{}'", name))
}

pub async fn count(backend: &Backend, args: FilterArgs) -> Result<()> {
    let explorer = explorer(backend, &args).await?;
    let matching = explorer.matching().await?;
    println!("{}", matching.count());
    Ok(())
}

pub async fn recommend(backend: &Backend, args: FilterArgs) -> Result<()> {
    let explorer = explorer(backend, &args).await?;
    let Some(recommendations) = explorer.refresh_recommendations().await? else {
        bail!("Filters changed while ranking keys");
    };

    for recommendation in &recommendations {
        println!(
            "{}\t{}\t{}",
            recommendation.count,
            recommendation.key.name(),
            recommendation.key.kind().as_str()
        );
    }
    info!(
        keys = recommendations.len(),
        cache = ?backend.queries.stats(),
        "Ranked keys"
    );
    Ok(())
}

pub async fn download(backend: &Backend, args: DownloadArgs) -> Result<()> {
    let explorer = explorer(backend, &args.filters).await?;
    let ids = explorer.matching().await?.pulse_ids();
    if ids.is_empty() {
        warn!("No pulses match the given filters");
    }

    let pulses = backend.queries.get_pulses(&ids).await?;
    let count = pulses.len();
    let json = pulse_file(pulses)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(pulses = count, path = %path.display(), "Downloaded pulses");
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Render pulses in the same file format `upload` accepts.
fn pulse_file(pulses: Vec<Pulse>) -> Result<String> {
    let annotated: Vec<AnnotatedPulse> = pulses.into_iter().map(AnnotatedPulse::from_backend).collect();
    serde_json::to_string_pretty(&annotated).context("Failed to serialize pulses")
}
