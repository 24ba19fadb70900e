//! Interactive filter session.
//!
//! `Explorer` owns a [`FilterStore`] and a pulse index. Recommendations and
//! key selections run without holding any lock across lookups; results
//! computed against state that has since changed are dropped instead of
//! being published out of order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use terastore_client::{ClientError, PulseIndex};
use terastore_core::{AttrKey, AttrKind, FilterResult, PulseFilter};
use tracing::{debug, info, instrument};

use crate::error::{EngineError, StoreError};
use crate::generation::GenerationCounter;
use crate::match_count::{date_bounds, number_bounds, string_value_results};
use crate::recommend::{recommend, Recommendation};
use crate::store::{FilterStore, StoreSnapshot};

/// Choices offered for a selected key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOptions {
    /// One result per known value; the value's filter is each result's last filter.
    Values(Vec<FilterResult>),
    /// Observed numeric span, if the key has numeric values.
    NumberRange(Option<(f64, f64)>),
    /// Whole-day span of the currently matching pulses.
    DateRange(Option<(DateTime<Utc>, DateTime<Utc>)>),
}

pub struct Explorer<I: PulseIndex> {
    index: I,
    store: Mutex<FilterStore>,
    recommendations: Mutex<Option<Vec<Recommendation>>>,
    selection: GenerationCounter,
    selected: Mutex<Option<(AttrKey, KeyOptions)>>,
}

impl<I: PulseIndex> Explorer<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            store: Mutex::new(FilterStore::new()),
            recommendations: Mutex::new(None),
            selection: GenerationCounter::new(),
            selected: Mutex::new(None),
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Load candidate keys from the index.
    pub async fn fetch_initial_state(&self) -> Result<(), ClientError> {
        let keys = self.index.list_keys().await?;
        self.store.lock().initialize(keys);
        Ok(())
    }

    pub fn add_filter(&self, filter: PulseFilter) {
        self.store.lock().add_filter(filter);
    }

    pub fn remove_filter(&self, filter: &PulseFilter) -> Result<bool, StoreError> {
        self.store.lock().remove_filter(filter)
    }

    pub fn applied_filters(&self) -> Vec<PulseFilter> {
        self.store.lock().applied_filters().to_vec()
    }

    pub fn candidate_keys(&self) -> Option<Vec<AttrKey>> {
        self.store.lock().candidate_keys().map(<[AttrKey]>::to_vec)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.lock().snapshot()
    }

    /// Recompute recommendations for the current filters.
    ///
    /// Returns `None` when the store changed while counting; the previously
    /// published list is kept in that case.
    #[instrument(skip(self))]
    pub async fn refresh_recommendations(&self) -> Result<Option<Vec<Recommendation>>, EngineError> {
        let snapshot = self.snapshot();
        let candidates = snapshot.candidates.ok_or(StoreError::Uninitialized)?;

        let recommendations = recommend(&self.index, &candidates, &snapshot.applied).await?;

        let store = self.store.lock();
        if store.generation() != snapshot.generation {
            debug!(
                computed_for = snapshot.generation.value(),
                current = store.generation().value(),
                "Dropping stale recommendations"
            );
            return Ok(None);
        }
        *self.recommendations.lock() = Some(recommendations.clone());
        info!(count = recommendations.len(), "Published recommendations");
        Ok(Some(recommendations))
    }

    /// Last published recommendations.
    pub fn recommendations(&self) -> Option<Vec<Recommendation>> {
        self.recommendations.lock().clone()
    }

    /// Load the options for `key` under the applied filters.
    ///
    /// Returns `None` if another key was selected, or the filters changed,
    /// before this one resolved.
    #[instrument(skip(self, key), fields(key = %key.name()))]
    pub async fn select_key(&self, key: AttrKey) -> Result<Option<KeyOptions>, ClientError> {
        let ticket = self.selection.advance();
        let StoreSnapshot { applied, generation, .. } = self.snapshot();

        let options = match key.kind() {
            AttrKind::String => KeyOptions::Values(string_value_results(&self.index, &key, &applied).await?),
            AttrKind::Number => KeyOptions::NumberRange(number_bounds(&self.index, &key).await?),
            AttrKind::Date => KeyOptions::DateRange(date_bounds(&self.index, &applied).await?),
        };

        if !self.selection.is_current(ticket) {
            debug!(ticket = ticket.value(), "Dropping superseded key selection");
            return Ok(None);
        }
        let store = self.store.lock();
        if store.generation() != generation {
            debug!(
                computed_for = generation.value(),
                current = store.generation().value(),
                "Dropping key options computed for old filters"
            );
            return Ok(None);
        }
        *self.selected.lock() = Some((key, options.clone()));
        Ok(Some(options))
    }

    pub fn selected_values(&self) -> Option<(AttrKey, KeyOptions)> {
        self.selected.lock().clone()
    }

    /// Pulses matching all applied filters.
    pub async fn matching(&self) -> Result<FilterResult, ClientError> {
        let applied = self.applied_filters();
        self.index.filter_pulses(&applied).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_index;
    use std::time::Duration;

    async fn explorer() -> Explorer<crate::testing::MemoryIndex> {
        let explorer = Explorer::new(sample_index());
        explorer.fetch_initial_state().await.unwrap();
        explorer
    }

    #[tokio::test]
    async fn refresh_publishes_ranking() {
        let explorer = explorer().await;
        let published = explorer.refresh_recommendations().await.unwrap().unwrap();
        let names: Vec<_> = published.iter().map(|r| r.key.name().to_string()).collect();
        assert_eq!(names, vec!["date", "sample", "temperature"]);
        assert_eq!(explorer.recommendations(), Some(published));
    }

    #[tokio::test]
    async fn refresh_requires_initial_state() {
        let explorer = Explorer::new(sample_index());
        let err = explorer.refresh_recommendations().await.unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Uninitialized)));
    }

    #[tokio::test]
    async fn stale_recommendations_are_dropped() {
        let explorer = Explorer::new(sample_index().with_delay(Duration::from_millis(50)));
        explorer.fetch_initial_state().await.unwrap();
        let filter = PulseFilter::string(AttrKey::string("sample"), "foo");

        let (refreshed, ()) = tokio::join!(explorer.refresh_recommendations(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            explorer.add_filter(filter.clone());
        });

        assert_eq!(refreshed.unwrap(), None);
        assert_eq!(explorer.recommendations(), None);

        let fresh = explorer.refresh_recommendations().await.unwrap().unwrap();
        assert!(fresh.iter().all(|r| r.key.name() != "sample"));
    }

    #[tokio::test]
    async fn superseded_selection_is_dropped() {
        let explorer = Explorer::new(sample_index().with_delay(Duration::from_millis(30)));
        explorer.fetch_initial_state().await.unwrap();

        let (first, second) = tokio::join!(explorer.select_key(AttrKey::string("sample")), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            explorer.select_key(AttrKey::number("temperature")).await
        });

        assert_eq!(first.unwrap(), None);
        assert_eq!(second.unwrap(), Some(KeyOptions::NumberRange(Some((10.0, 30.0)))));
        let (key, _) = explorer.selected_values().unwrap();
        assert_eq!(key, AttrKey::number("temperature"));
    }

    #[tokio::test]
    async fn selection_computed_for_old_filters_is_dropped() {
        let explorer = Explorer::new(sample_index().with_delay(Duration::from_millis(30)));
        explorer.fetch_initial_state().await.unwrap();
        let filter = PulseFilter::string(AttrKey::string("sample"), "bar");

        let (selected, ()) = tokio::join!(explorer.select_key(AttrKey::string("sample")), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            explorer.add_filter(filter.clone());
        });

        assert_eq!(selected.unwrap(), None);
        assert_eq!(explorer.selected_values(), None);

        let fresh = explorer.select_key(AttrKey::string("sample")).await.unwrap();
        assert!(fresh.is_some());
    }

    #[tokio::test]
    async fn string_selection_lists_values_under_filters() {
        let explorer = explorer().await;
        explorer.add_filter(PulseFilter::number(AttrKey::number("temperature"), 0.0, 15.0).unwrap());

        let options = explorer.select_key(AttrKey::string("sample")).await.unwrap().unwrap();
        let KeyOptions::Values(results) = options else {
            panic!("expected value options");
        };
        let counts: Vec<_> = results.iter().map(FilterResult::count).collect();
        assert_eq!(counts, vec![1, 0]);
    }

    #[tokio::test]
    async fn matching_follows_applied_filters() {
        let explorer = explorer().await;
        assert_eq!(explorer.matching().await.unwrap().count(), 4);

        let foo = PulseFilter::string(AttrKey::string("sample"), "foo");
        explorer.add_filter(foo.clone());
        assert_eq!(explorer.matching().await.unwrap().pulse_ids().len(), 2);

        assert!(explorer.remove_filter(&foo).unwrap());
        assert_eq!(explorer.matching().await.unwrap().count(), 4);
        assert_eq!(explorer.candidate_keys().unwrap().len(), 4);
    }
}
