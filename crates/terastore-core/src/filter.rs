//! Pulse filters
//!
//! A filter restricts pulses by one attribute key: string equality, a numeric
//! range or a date range. Filters are immutable value objects; range filters
//! are validated on construction so `lower <= upper` always holds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attr::AttrKey;
use crate::error::CoreError;

/// Equality filter on a string attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct StringFilter {
    key: AttrKey,
    value: String,
}

impl StringFilter {
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Inclusive range filter on a numeric attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFilter {
    key: AttrKey,
    lower: f64,
    upper: f64,
}

impl NumberFilter {
    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

/// Inclusive range filter on a date attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    key: AttrKey,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
}

impl DateFilter {
    pub fn lower(&self) -> DateTime<Utc> {
        self.lower
    }

    pub fn upper(&self) -> DateTime<Utc> {
        self.upper
    }
}

/// Any filter that can be applied to the pulse listing.
#[derive(Debug, Clone, PartialEq)]
pub enum PulseFilter {
    String(StringFilter),
    Number(NumberFilter),
    Date(DateFilter),
}

/// Filter shape accepted by `POST /attrs/filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendFilter {
    Value {
        key: String,
        value: String,
    },
    NumberRange {
        key: String,
        min_value: f64,
        max_value: f64,
    },
    DateRange {
        key: String,
        min_value: String,
        max_value: String,
    },
}

impl PulseFilter {
    pub fn string(key: AttrKey, value: impl Into<String>) -> Self {
        PulseFilter::String(StringFilter {
            key,
            value: value.into(),
        })
    }

    pub fn number(key: AttrKey, lower: f64, upper: f64) -> Result<Self, CoreError> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(CoreError::InvertedRange {
                key: key.name().to_string(),
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }
        Ok(PulseFilter::Number(NumberFilter {
            key,
            lower: positive_zero(lower),
            upper: positive_zero(upper),
        }))
    }

    pub fn date(key: AttrKey, lower: DateTime<Utc>, upper: DateTime<Utc>) -> Result<Self, CoreError> {
        if lower > upper {
            return Err(CoreError::InvertedRange {
                key: key.name().to_string(),
                lower: iso_millis(&lower),
                upper: iso_millis(&upper),
            });
        }
        Ok(PulseFilter::Date(DateFilter { key, lower, upper }))
    }

    pub fn key(&self) -> &AttrKey {
        match self {
            PulseFilter::String(f) => &f.key,
            PulseFilter::Number(f) => &f.key,
            PulseFilter::Date(f) => &f.key,
        }
    }

    /// Stable identity of the filter's semantic content.
    ///
    /// Used as cache key component and as sort key when canonicalizing
    /// filter sets sent to the backend.
    pub fn fingerprint(&self) -> String {
        match self {
            PulseFilter::String(f) => format!("{}:{}", f.key.name(), f.value),
            PulseFilter::Number(f) => format!("{}:{}-{}", f.key.name(), f.lower, f.upper),
            PulseFilter::Date(f) => format!(
                "{}:{}-{}",
                f.key.name(),
                iso_millis(&f.lower),
                iso_millis(&f.upper)
            ),
        }
    }

    /// Kind, key name and bounds as separate strings.
    ///
    /// Unlike [`fingerprint`](Self::fingerprint) no two distinct filters share
    /// these parts, so they are safe to hash as a cache key. String filters
    /// leave the last part empty.
    pub fn identity_parts(&self) -> [String; 4] {
        match self {
            PulseFilter::String(f) => [
                f.key.kind().as_str().to_string(),
                f.key.name().to_string(),
                f.value.clone(),
                String::new(),
            ],
            PulseFilter::Number(f) => [
                f.key.kind().as_str().to_string(),
                f.key.name().to_string(),
                f.lower.to_string(),
                f.upper.to_string(),
            ],
            PulseFilter::Date(f) => [
                f.key.kind().as_str().to_string(),
                f.key.name().to_string(),
                iso_millis(&f.lower),
                iso_millis(&f.upper),
            ],
        }
    }

    /// Value part shown to users, without the key.
    pub fn display_value(&self) -> String {
        match self {
            PulseFilter::String(f) => f.value.clone(),
            PulseFilter::Number(f) => format!("{}-{}", f.lower, f.upper),
            PulseFilter::Date(f) => format!("{} - {}", short_date(&f.lower), short_date(&f.upper)),
        }
    }

    /// Human-readable `key: value` label.
    pub fn label(&self) -> String {
        format!("{}: {}", self.key().name(), self.display_value())
    }

    pub fn to_backend(&self) -> BackendFilter {
        match self {
            PulseFilter::String(f) => BackendFilter::Value {
                key: f.key.name().to_string(),
                value: f.value.clone(),
            },
            PulseFilter::Number(f) => BackendFilter::NumberRange {
                key: f.key.name().to_string(),
                min_value: f.lower,
                max_value: f.upper,
            },
            PulseFilter::Date(f) => BackendFilter::DateRange {
                key: f.key.name().to_string(),
                min_value: iso_millis(&f.lower),
                max_value: iso_millis(&f.upper),
            },
        }
    }
}

impl fmt::Display for PulseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Sort filters by fingerprint so equal sets produce equal requests.
pub fn canonical_order(filters: &[PulseFilter]) -> Vec<PulseFilter> {
    let mut sorted = filters.to_vec();
    sorted.sort_by_cached_key(|f| (f.fingerprint(), f.identity_parts()));
    sorted
}

fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// -0.0 == 0.0, so both must print the same.
fn positive_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

fn short_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y/%-m/%-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn fingerprints_are_stable() {
        let sample = PulseFilter::string(AttrKey::string("sample"), "foo");
        assert_eq!(sample.fingerprint(), "sample:foo");
        assert_eq!(sample.fingerprint(), sample.clone().fingerprint());

        let temp = PulseFilter::number(AttrKey::number("temp"), 1.0, 2.5).unwrap();
        assert_eq!(temp.fingerprint(), "temp:1-2.5");

        let date = PulseFilter::date(AttrKey::creation_date(), utc(2000, 1, 1), utc(2100, 1, 1)).unwrap();
        assert_eq!(
            date.fingerprint(),
            "date:2000-01-01T00:00:00.000Z-2100-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn equal_content_equal_fingerprint() {
        let a = PulseFilter::number(AttrKey::number("temp"), 0.0, 10.0).unwrap();
        let b = PulseFilter::number(AttrKey::new("temp", crate::AttrKind::Number), 0.0, 10.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn negative_zero_bounds_match_zero() {
        let neg = PulseFilter::number(AttrKey::number("t"), -0.0, 1.0).unwrap();
        let pos = PulseFilter::number(AttrKey::number("t"), 0.0, 1.0).unwrap();
        assert_eq!(neg, pos);
        assert_eq!(neg.fingerprint(), pos.fingerprint());
        assert_eq!(neg.identity_parts(), pos.identity_parts());
    }

    #[test]
    fn identity_parts_separate_kind_and_key() {
        let text = PulseFilter::string(AttrKey::string("temp"), "1-2");
        let range = PulseFilter::number(AttrKey::number("temp"), 1.0, 2.0).unwrap();
        assert_eq!(text.fingerprint(), range.fingerprint());
        assert_ne!(text.identity_parts(), range.identity_parts());

        let split_key = PulseFilter::string(AttrKey::string("a:b"), "c");
        let split_value = PulseFilter::string(AttrKey::string("a"), "b:c");
        assert_ne!(split_key.identity_parts(), split_value.identity_parts());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert!(PulseFilter::number(AttrKey::number("temp"), 3.0, 1.0).is_err());
        assert!(PulseFilter::number(AttrKey::number("temp"), f64::NAN, 1.0).is_err());
        assert!(PulseFilter::date(AttrKey::creation_date(), utc(2024, 1, 2), utc(2024, 1, 1)).is_err());
        assert!(PulseFilter::number(AttrKey::number("temp"), 1.0, 1.0).is_ok());
    }

    #[test]
    fn labels() {
        let sample = PulseFilter::string(AttrKey::string("sample"), "foo");
        assert_eq!(sample.label(), "sample: foo");
        assert_eq!(sample.display_value(), "foo");

        let date = PulseFilter::date(AttrKey::creation_date(), utc(2023, 1, 5), utc(2023, 11, 19)).unwrap();
        assert_eq!(date.label(), "date: 2023/1/5 - 2023/11/19");
    }

    #[test]
    fn backend_serialization() {
        let sample = PulseFilter::string(AttrKey::string("sample"), "foo");
        assert_eq!(
            serde_json::to_value(sample.to_backend()).unwrap(),
            serde_json::json!({"key": "sample", "value": "foo"})
        );

        let temp = PulseFilter::number(AttrKey::number("temp"), 1.0, 2.0).unwrap();
        assert_eq!(
            serde_json::to_value(temp.to_backend()).unwrap(),
            serde_json::json!({"key": "temp", "min_value": 1.0, "max_value": 2.0})
        );

        let date = PulseFilter::date(AttrKey::creation_date(), utc(2000, 1, 1), utc(2000, 1, 2)).unwrap();
        assert_eq!(
            serde_json::to_value(date.to_backend()).unwrap(),
            serde_json::json!({
                "key": "date",
                "min_value": "2000-01-01T00:00:00.000Z",
                "max_value": "2000-01-02T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn canonical_order_ignores_input_order() {
        let a = PulseFilter::string(AttrKey::string("a"), "x");
        let b = PulseFilter::number(AttrKey::number("b"), 0.0, 1.0).unwrap();
        let c = PulseFilter::string(AttrKey::string("c"), "y");

        let one = canonical_order(&[c.clone(), a.clone(), b.clone()]);
        let two = canonical_order(&[b.clone(), c.clone(), a.clone()]);
        assert_eq!(one, two);
        assert_eq!(one, vec![a, b, c]);
    }
}
