//! Match-count strategies per attribute kind.
//!
//! Each candidate key is scored by how many pulses it could still narrow
//! down to under the current filter set:
//!
//! - string keys: one lookup per known value, counts summed
//! - number keys: one lookup over the observed `[min, max]` span
//! - date keys: one lookup over a fixed wide span

use chrono::{DateTime, NaiveTime, Utc};
use futures::future::try_join_all;
use terastore_client::{ClientError, PulseIndex};
use terastore_core::{AttrKey, AttrKind, AttrValue, FilterResult, PulseFilter};
use tracing::{debug, instrument};

// 2000-01-01T00:00:00Z and 2100-01-01T00:00:00Z
const DATE_SPAN_START: i64 = 946_684_800;
const DATE_SPAN_END: i64 = 4_102_444_800;

/// Fixed span used to count matches for date keys.
pub fn full_date_span() -> (DateTime<Utc>, DateTime<Utc>) {
    (
        DateTime::from_timestamp(DATE_SPAN_START, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
        DateTime::from_timestamp(DATE_SPAN_END, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

/// Number of pulses `key` would match when added to `base`.
#[instrument(skip(index, key, base), fields(key = %key.name(), kind = key.kind().as_str(), base = base.len()))]
pub async fn match_count<I>(index: &I, key: &AttrKey, base: &[PulseFilter]) -> Result<usize, ClientError>
where
    I: PulseIndex + ?Sized,
{
    let count: usize = match key.kind() {
        AttrKind::String => string_value_results(index, key, base)
            .await?
            .iter()
            .map(FilterResult::count)
            .sum(),
        AttrKind::Number => match number_bounds(index, key).await? {
            Some((lower, upper)) => {
                let filter = PulseFilter::number(key.clone(), lower, upper)?;
                index.filter_pulses(&with_filter(base, filter)).await?.count()
            }
            None => 0,
        },
        AttrKind::Date => {
            let (lower, upper) = full_date_span();
            let filter = PulseFilter::date(key.clone(), lower, upper)?;
            index.filter_pulses(&with_filter(base, filter)).await?.count()
        }
    };

    debug!(count, "Computed match count");
    Ok(count)
}

/// One filter result per known value of a string key, in value order.
///
/// The candidate filter is always the last element of each result's filter list.
pub async fn string_value_results<I>(
    index: &I,
    key: &AttrKey,
    base: &[PulseFilter],
) -> Result<Vec<FilterResult>, ClientError>
where
    I: PulseIndex + ?Sized,
{
    let values = index.key_values(key).await?;
    let filter_sets: Vec<Vec<PulseFilter>> = values
        .iter()
        .map(|value| with_filter(base, PulseFilter::string(key.clone(), value.to_string())))
        .collect();

    try_join_all(filter_sets.iter().map(|filters| index.filter_pulses(filters))).await
}

/// Observed `[min, max]` of a number key, or `None` without numeric values.
pub async fn number_bounds<I>(index: &I, key: &AttrKey) -> Result<Option<(f64, f64)>, ClientError>
where
    I: PulseIndex + ?Sized,
{
    let values = index.key_values(key).await?;
    let mut numbers: Vec<f64> = values.iter().filter_map(numeric).collect();
    numbers.sort_by(f64::total_cmp);
    numbers.dedup();

    Ok(numbers.first().copied().zip(numbers.last().copied()))
}

/// Whole-day span covering the creation times of pulses matching `base`.
///
/// Runs from the start of the earliest day to the last millisecond of the
/// latest day, so a date filter built from it keeps every current match.
pub async fn date_bounds<I>(
    index: &I,
    base: &[PulseFilter],
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ClientError>
where
    I: PulseIndex + ?Sized,
{
    let result = index.filter_pulses(base).await?;
    Ok(result.creation_span().and_then(|(first, last)| day_span(first, last)))
}

fn day_span(first: DateTime<Utc>, last: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    Some((
        first.date_naive().and_time(NaiveTime::MIN).and_utc(),
        last.date_naive().and_time(end_of_day).and_utc(),
    ))
}

fn numeric(value: &AttrValue) -> Option<f64> {
    match value {
        AttrValue::Number(n) if n.is_finite() => Some(*n),
        AttrValue::Number(_) => None,
        AttrValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

fn with_filter(base: &[PulseFilter], filter: PulseFilter) -> Vec<PulseFilter> {
    let mut filters = Vec::with_capacity(base.len() + 1);
    filters.extend_from_slice(base);
    filters.push(filter);
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, sample_index};
    use chrono::TimeZone;

    #[tokio::test]
    async fn string_key_sums_per_value_counts() {
        let index = sample_index();
        let count = match_count(&index, &AttrKey::string("sample"), &[]).await.unwrap();
        assert_eq!(count, 3);
        // one value listing, one lookup per value
        assert_eq!(index.filter_calls(), 2);
    }

    #[tokio::test]
    async fn string_key_respects_base_filters() {
        let index = sample_index();
        let base = vec![PulseFilter::number(AttrKey::number("temperature"), 15.0, 40.0).unwrap()];
        let count = match_count(&index, &AttrKey::string("sample"), &base).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn number_key_uses_observed_span() {
        let index = sample_index();
        let count = match_count(&index, &AttrKey::number("temperature"), &[]).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(number_bounds(&index, &AttrKey::number("temperature")).await.unwrap(), Some((10.0, 30.0)));
    }

    #[tokio::test]
    async fn number_key_without_values_counts_zero_without_lookup() {
        let index = sample_index();
        let count = match_count(&index, &AttrKey::number("voltage"), &[]).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(index.filter_calls(), 0);
    }

    #[tokio::test]
    async fn date_key_counts_everything_in_wide_span() {
        let index = sample_index();
        let count = match_count(&index, &AttrKey::creation_date(), &[]).await.unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn string_results_end_with_candidate_filter() {
        let index = sample_index();
        let key = AttrKey::string("sample");
        let results = string_value_results(&index, &key, &[]).await.unwrap();

        let labels: Vec<_> = results
            .iter()
            .map(|r| (r.last_filter().unwrap().display_value(), r.count()))
            .collect();
        assert_eq!(labels, vec![("foo".to_string(), 2), ("bar".to_string(), 1)]);
    }

    #[tokio::test]
    async fn date_bounds_cover_whole_days() {
        let index = sample_index();
        let (lower, upper) = date_bounds(&index, &[]).await.unwrap().unwrap();
        assert_eq!(lower, Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap());
        assert_eq!(upper, day(4).date_naive().and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc());
    }

    #[tokio::test]
    async fn date_bounds_empty_without_matches() {
        let index = sample_index();
        let base = vec![PulseFilter::string(AttrKey::string("sample"), "missing")];
        assert_eq!(date_bounds(&index, &base).await.unwrap(), None);
    }

    #[test]
    fn full_span_is_ordered() {
        let (lower, upper) = full_date_span();
        assert_eq!(lower, Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(upper, Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn text_numbers_are_accepted() {
        assert_eq!(numeric(&AttrValue::from(" 2.5 ")), Some(2.5));
        assert_eq!(numeric(&AttrValue::from("n/a")), None);
        assert_eq!(numeric(&AttrValue::Number(f64::NAN)), None);
    }
}
