//! Result of applying a filter set to the pulse listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::filter::PulseFilter;

/// Backend pulse identifier.
///
/// Older backends return integer ids, newer ones UUID strings; both are kept
/// as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PulseId(String);

impl PulseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PulseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PulseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PulseId(s),
            Raw::Int(n) => PulseId(n.to_string()),
        })
    }
}

/// Identity and creation time of a matching pulse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseMetadata {
    pub pulse_id: PulseId,
    pub creation_time: DateTime<Utc>,
}

/// A filter set paired with the pulses it matches.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub filters: Vec<PulseFilter>,
    pub matches: Vec<PulseMetadata>,
}

impl FilterResult {
    pub fn new(filters: Vec<PulseFilter>, matches: Vec<PulseMetadata>) -> Self {
        Self { filters, matches }
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    /// The filter appended last, i.e. the candidate being evaluated.
    pub fn last_filter(&self) -> Option<&PulseFilter> {
        self.filters.last()
    }

    pub fn pulse_ids(&self) -> Vec<PulseId> {
        self.matches.iter().map(|m| m.pulse_id.clone()).collect()
    }

    /// Earliest and latest creation time among the matches.
    pub fn creation_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let min = self.matches.iter().map(|m| m.creation_time).min()?;
        let max = self.matches.iter().map(|m| m.creation_time).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttrKey;
    use chrono::TimeZone;

    fn meta(id: &str, day: u32) -> PulseMetadata {
        PulseMetadata {
            pulse_id: PulseId::new(id),
            creation_time: Utc.with_ymd_and_hms(2023, 11, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn count_and_last_filter() {
        let a = PulseFilter::string(AttrKey::string("a"), "x");
        let b = PulseFilter::string(AttrKey::string("b"), "y");
        let result = FilterResult::new(vec![a, b.clone()], vec![meta("1", 1), meta("2", 3)]);
        assert_eq!(result.count(), 2);
        assert_eq!(result.last_filter(), Some(&b));
        assert_eq!(result.pulse_ids(), vec![PulseId::new("1"), PulseId::new("2")]);
    }

    #[test]
    fn empty_result() {
        let result = FilterResult::new(vec![], vec![]);
        assert_eq!(result.count(), 0);
        assert!(result.last_filter().is_none());
        assert!(result.creation_span().is_none());
    }

    #[test]
    fn creation_span_covers_all_matches() {
        let result = FilterResult::new(vec![], vec![meta("1", 5), meta("2", 2), meta("3", 9)]);
        let (lo, hi) = result.creation_span().unwrap();
        assert_eq!(lo, meta("x", 2).creation_time);
        assert_eq!(hi, meta("x", 9).creation_time);
    }

    #[test]
    fn pulse_id_accepts_numbers() {
        let ids: Vec<PulseId> = serde_json::from_str(r#"[7, "c0ffee"]"#).unwrap();
        assert_eq!(ids, vec![PulseId::new("7"), PulseId::new("c0ffee")]);
    }
}
