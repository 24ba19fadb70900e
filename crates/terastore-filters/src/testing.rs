//! In-memory pulse index for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use terastore_client::{ClientError, PulseIndex};
use terastore_core::{AttrKey, AttrValue, FilterResult, PulseFilter, PulseId, PulseMetadata};

pub struct MemoryPulse {
    pub id: &'static str,
    pub created: DateTime<Utc>,
    pub attributes: Vec<(&'static str, AttrValue)>,
}

impl MemoryPulse {
    fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    fn matches(&self, filter: &PulseFilter) -> bool {
        let name = filter.key().name();
        match filter {
            PulseFilter::String(f) => {
                matches!(self.attribute(name), Some(AttrValue::Text(v)) if v == f.value())
            }
            PulseFilter::Number(f) => self
                .attribute(name)
                .and_then(AttrValue::as_number)
                .is_some_and(|n| f.lower() <= n && n <= f.upper()),
            PulseFilter::Date(f) => f.lower() <= self.created && self.created <= f.upper(),
        }
    }
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, d, 12, 0, 0).unwrap()
}

/// Pulse index answering from a fixed list, optionally slowed down.
pub struct MemoryIndex {
    keys: Vec<AttrKey>,
    pulses: Vec<MemoryPulse>,
    delay: Option<Duration>,
    filter_calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MemoryIndex {
    pub fn new(keys: Vec<AttrKey>, pulses: Vec<MemoryPulse>) -> Self {
        Self {
            keys,
            pulses,
            delay: None,
            filter_calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PulseIndex for MemoryIndex {
    async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError> {
        self.pause().await;
        Ok(self.keys.clone())
    }

    async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        self.pause().await;
        let mut values: Vec<AttrValue> = Vec::new();
        for value in self.pulses.iter().filter_map(|p| p.attribute(key.name())) {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
        Ok(values)
    }

    async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let matches = self
            .pulses
            .iter()
            .filter(|p| filters.iter().all(|f| p.matches(f)))
            .map(|p| PulseMetadata {
                pulse_id: PulseId::new(p.id),
                creation_time: p.created,
            })
            .collect();
        Ok(FilterResult::new(filters.to_vec(), matches))
    }
}

/// Four pulses over two backend keys plus an empty number key:
///
/// | id | sample | temperature | created    |
/// |----|--------|-------------|------------|
/// | p1 | foo    | 10          | 2023-11-01 |
/// | p2 | foo    | 20          | 2023-11-02 |
/// | p3 | bar    |             | 2023-11-03 |
/// | p4 |        | 30          | 2023-11-04 |
pub fn sample_index() -> MemoryIndex {
    MemoryIndex::new(
        vec![
            AttrKey::string("sample"),
            AttrKey::number("temperature"),
            AttrKey::number("voltage"),
        ],
        vec![
            MemoryPulse {
                id: "p1",
                created: day(1),
                attributes: vec![("sample", "foo".into()), ("temperature", 10.0.into())],
            },
            MemoryPulse {
                id: "p2",
                created: day(2),
                attributes: vec![("sample", "foo".into()), ("temperature", 20.0.into())],
            },
            MemoryPulse {
                id: "p3",
                created: day(3),
                attributes: vec![("sample", "bar".into())],
            },
            MemoryPulse {
                id: "p4",
                created: day(4),
                attributes: vec![("temperature", 30.0.into())],
            },
        ],
    )
}
