//! Applied filters and the keys still available for filtering.
//!
//! The store keeps two collections in step: filters the user applied and
//! candidate keys not used by any applied filter. Together they always
//! cover the key universe loaded by [`FilterStore::fetch_initial_state`].

use terastore_client::{ClientError, PulseIndex};
use terastore_core::{AttrKey, PulseFilter};
use tracing::debug;

use crate::error::StoreError;
use crate::generation::Generation;

/// Point-in-time copy of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub applied: Vec<PulseFilter>,
    pub candidates: Option<Vec<AttrKey>>,
    pub generation: Generation,
}

#[derive(Debug, Default)]
pub struct FilterStore {
    applied: Vec<PulseFilter>,
    candidates: Option<Vec<AttrKey>>,
    universe: Vec<AttrKey>,
    generation: Generation,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the backend key listing plus the synthetic creation-date key.
    pub async fn fetch_initial_state<I>(&mut self, index: &I) -> Result<(), ClientError>
    where
        I: PulseIndex + ?Sized,
    {
        let keys = index.list_keys().await?;
        self.initialize(keys);
        Ok(())
    }

    /// Install `keys` as the key universe.
    ///
    /// The creation-date key is appended unless already listed. Keys used by
    /// filters applied before initialization are not offered as candidates.
    pub fn initialize(&mut self, mut keys: Vec<AttrKey>) {
        let date = AttrKey::creation_date();
        if !keys.contains(&date) {
            keys.push(date);
        }

        let candidates = keys
            .iter()
            .filter(|key| !self.applied.iter().any(|f| f.key() == *key))
            .cloned()
            .collect();

        debug!(keys = keys.len(), "Initialized filter store");
        self.universe = keys;
        self.candidates = Some(candidates);
        self.bump();
    }

    /// Apply `filter` and withdraw its key from the candidates.
    pub fn add_filter(&mut self, filter: PulseFilter) {
        if let Some(candidates) = self.candidates.as_mut() {
            candidates.retain(|key| key != filter.key());
        }
        debug!(filter = %filter, "Applied filter");
        self.applied.push(filter);
        self.bump();
    }

    /// Remove the first applied filter equal to `filter`.
    ///
    /// Its key becomes a candidate again, at its original position, once no
    /// other applied filter uses it. Returns whether a filter was removed.
    pub fn remove_filter(&mut self, filter: &PulseFilter) -> Result<bool, StoreError> {
        let candidates = self.candidates.as_mut().ok_or(StoreError::Uninitialized)?;

        let Some(position) = self.applied.iter().position(|f| f == filter) else {
            return Ok(false);
        };
        self.applied.remove(position);

        let key = filter.key();
        if !self.applied.iter().any(|f| f.key() == key) && !candidates.contains(key) {
            insert_in_universe_order(&self.universe, candidates, key.clone());
        }

        debug!(filter = %filter, "Removed filter");
        self.bump();
        Ok(true)
    }

    pub fn applied_filters(&self) -> &[PulseFilter] {
        &self.applied
    }

    /// Keys not used by any applied filter; `None` before initialization.
    pub fn candidate_keys(&self) -> Option<&[AttrKey]> {
        self.candidates.as_deref()
    }

    pub fn universe(&self) -> &[AttrKey] {
        &self.universe
    }

    pub fn is_initialized(&self) -> bool {
        self.candidates.is_some()
    }

    /// Bumped by every mutation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            applied: self.applied.clone(),
            candidates: self.candidates.clone(),
            generation: self.generation,
        }
    }

    fn bump(&mut self) {
        self.generation = self.generation.next();
    }
}

fn insert_in_universe_order(universe: &[AttrKey], candidates: &mut Vec<AttrKey>, key: AttrKey) {
    let rank = |k: &AttrKey| universe.iter().position(|u| u == k).unwrap_or(usize::MAX);
    let key_rank = rank(&key);
    let at = candidates
        .iter()
        .position(|c| rank(c) > key_rank)
        .unwrap_or(candidates.len());
    candidates.insert(at, key);
}
