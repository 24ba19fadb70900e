//! Pulses, devices and the uploadable pulse format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attr::AttrValue;
use crate::error::UploadError;
use crate::filter_result::PulseId;

/// A device registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    #[serde(alias = "friendly_name")]
    pub serial_number: String,
}

/// One key/value annotation on a pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseAttribute {
    pub key: String,
    pub value: AttrValue,
}

/// Sampled waveform of a pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub time: Vec<f64>,
    pub signal: Vec<f64>,
    #[serde(default)]
    pub signal_err: Option<Vec<f64>>,
}

/// A pulse as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub pulse_id: PulseId,
    pub delays: Vec<f64>,
    pub signal: Vec<f64>,
    #[serde(default)]
    pub signal_error: Option<Vec<f64>>,
    pub integration_time_ms: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub creation_time: DateTime<Utc>,
    pub device_id: String,
    #[serde(default)]
    pub pulse_attributes: Vec<PulseAttribute>,
}

/// Backend attribute on a pulse being created, tagged with its data type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendAttribute {
    pub key: String,
    pub value: AttrValue,
    pub data_type: &'static str,
}

/// Body element of `POST /pulses/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseCreate {
    pub delays: Vec<f64>,
    pub signal: Vec<f64>,
    pub signal_error: Option<Vec<f64>>,
    pub integration_time_ms: f64,
    pub creation_time: String,
    pub device_id: String,
    pub pulse_attributes: Vec<BackendAttribute>,
}

/// A pulse in the user-facing file format, used for upload and download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedPulse {
    pub pulse: Signal,
    pub integration_time_ms: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub creation_time: DateTime<Utc>,
    pub device_id: String,
    pub pulse_attributes: Vec<PulseAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_id: Option<PulseId>,
}

// Schema of an uploaded pulse before referential checks. Unknown fields,
// including the `pulse_id` of a downloaded file, are ignored.
#[derive(Deserialize)]
struct RawAnnotatedPulse {
    pulse: Signal,
    integration_time_ms: f64,
    creation_time: String,
    device_id: String,
    pulse_attributes: Vec<PulseAttribute>,
}

impl AnnotatedPulse {
    /// Validate one uploaded pulse object against the schema and the known devices.
    pub fn validate_and_parse(
        data: &serde_json::Value,
        devices: &[Device],
    ) -> Result<Self, UploadError> {
        let raw = RawAnnotatedPulse::deserialize(data)
            .map_err(|e| UploadError::Parse(format!("Failed to parse AnnotatedPulse: {}", e)))?;

        let creation_time = parse_timestamp(&raw.creation_time)
            .ok_or_else(|| UploadError::InvalidCreationTime(raw.creation_time.clone()))?;

        if !devices.iter().any(|d| d.device_id == raw.device_id) {
            return Err(UploadError::InvalidDevice(raw.device_id));
        }

        Ok(Self {
            pulse: raw.pulse,
            integration_time_ms: raw.integration_time_ms,
            creation_time,
            device_id: raw.device_id,
            pulse_attributes: raw.pulse_attributes,
            pulse_id: None,
        })
    }

    pub fn from_backend(pulse: Pulse) -> Self {
        Self {
            pulse: Signal {
                time: pulse.delays,
                signal: pulse.signal,
                signal_err: pulse.signal_error,
            },
            integration_time_ms: pulse.integration_time_ms,
            creation_time: pulse.creation_time,
            device_id: pulse.device_id,
            pulse_attributes: pulse.pulse_attributes,
            pulse_id: Some(pulse.pulse_id),
        }
    }

    pub fn to_backend(&self) -> PulseCreate {
        PulseCreate {
            delays: self.pulse.time.clone(),
            signal: self.pulse.signal.clone(),
            signal_error: self.pulse.signal_err.clone(),
            integration_time_ms: self.integration_time_ms,
            creation_time: self.creation_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            device_id: self.device_id.clone(),
            pulse_attributes: self
                .pulse_attributes
                .iter()
                .map(|attr| BackendAttribute {
                    key: attr.key.clone(),
                    value: attr.value.clone(),
                    data_type: attr.value.kind().as_str(),
                })
                .collect(),
        }
    }
}

/// Parse the timestamp formats seen in pulse files and backend responses.
///
/// Accepts RFC 3339 with offset, naive date-times (taken as UTC) and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
