//! `--filter` arguments
//!
//! Filters are given as `key=value`, `key=lo..hi` or, for dates,
//! `date=YYYY-MM-DD..YYYY-MM-DD`, and typed against the key listing.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::str::FromStr;
use terastore_core::{parse_timestamp, AttrKey, AttrKind, PulseFilter};

/// A filter as typed on the command line, not yet bound to a key kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub key: String,
    pub value: String,
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value or key=lo..hi, got '{}'", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in filter '{}'", s));
        }
        Ok(FilterArg {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Type each filter argument against `keys`.
pub fn resolve_filters(args: &[FilterArg], keys: &[AttrKey]) -> Result<Vec<PulseFilter>> {
    args.iter().map(|arg| resolve_filter(arg, keys)).collect()
}

fn resolve_filter(arg: &FilterArg, keys: &[AttrKey]) -> Result<PulseFilter> {
    let key = keys
        .iter()
        .find(|k| k.name() == arg.key)
        .ok_or_else(|| anyhow!("Unknown attribute key '{}'", arg.key))?
        .clone();

    let filter = match key.kind() {
        AttrKind::String => PulseFilter::string(key, arg.value.clone()),
        AttrKind::Number => {
            let (lower, upper) = split_range(&arg.value);
            let lower = parse_number(lower)?;
            let upper = parse_number(upper)?;
            PulseFilter::number(key, lower, upper)?
        }
        AttrKind::Date => {
            let (lower, upper) = split_range(&arg.value);
            let lower = parse_date_bound(lower, false)?;
            let upper = parse_date_bound(upper, true)?;
            PulseFilter::date(key, lower, upper)?
        }
    };
    Ok(filter)
}

// A single value is the range [v, v].
fn split_range(value: &str) -> (&str, &str) {
    value
        .split_once("..")
        .map(|(lo, hi)| (lo.trim(), hi.trim()))
        .unwrap_or((value, value))
}

fn parse_number(raw: &str) -> Result<f64> {
    let n = raw
        .parse::<f64>()
        .with_context(|| format!("'{}' is not a number", raw))?;
    if !n.is_finite() {
        bail!("'{}' is not a finite number", raw);
    }
    Ok(n)
}

/// Bare dates cover the whole day: midnight for lower bounds, the last
/// millisecond for upper bounds.
fn parse_date_bound(raw: &str, upper: bool) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if upper {
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
        } else {
            NaiveTime::MIN
        };
        return Ok(date.and_time(time).and_utc());
    }
    parse_timestamp(raw).ok_or_else(|| anyhow!("'{}' is not a date (expected YYYY-MM-DD)", raw))
}
