//! Ranking of candidate keys by match count.

use futures::future::try_join_all;
use terastore_client::{ClientError, PulseIndex};
use terastore_core::{AttrKey, PulseFilter};
use tracing::{debug, instrument};

use crate::match_count::match_count;

/// A candidate key and the number of pulses it could still match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub key: AttrKey,
    pub count: usize,
}

/// Score every candidate under `applied`, drop keys matching nothing and
/// order by count, highest first.
///
/// Keys are scored concurrently. Ties keep the order of `candidates`.
#[instrument(skip_all, fields(candidates = candidates.len(), applied = applied.len()))]
pub async fn recommend<I>(
    index: &I,
    candidates: &[AttrKey],
    applied: &[PulseFilter],
) -> Result<Vec<Recommendation>, ClientError>
where
    I: PulseIndex + ?Sized,
{
    let counts = try_join_all(candidates.iter().map(|key| match_count(index, key, applied))).await?;

    let mut recommendations: Vec<Recommendation> = candidates
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(key, count)| Recommendation {
            key: key.clone(),
            count,
        })
        .collect();
    recommendations.sort_by(|a, b| b.count.cmp(&a.count));

    debug!(
        recommended = recommendations.len(),
        excluded = candidates.len() - recommendations.len(),
        "Ranked candidate keys"
    );
    Ok(recommendations)
}
