//! Validation of pulse files selected for upload.
//!
//! A file holds one pulse object or an array of them. Files are processed
//! independently: one bad file is reported and skipped, the others go
//! through.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::UploadError;
use crate::pulse::{AnnotatedPulse, Device};

/// Default upper bound on the size of one upload file (50 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Identity of a selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
        }
    }

    /// `name-size-modified` identifier, stable for an unchanged file.
    pub fn file_id(&self) -> String {
        let modified = self.modified.map(|m| m.timestamp_millis()).unwrap_or_default();
        format!("{}-{}-{}", self.name, self.size, modified)
    }

    pub fn is_same_file(&self, other: &UploadFile) -> bool {
        self.name == other.name && self.size == other.size && self.modified == other.modified
    }

    fn is_json(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".json")
    }
}

/// A file together with its text content.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub file: UploadFile,
    pub content: String,
}

/// Outcome of processing a batch of candidate files.
#[derive(Debug, Default)]
pub struct UploadBatch {
    pub accepted: Vec<UploadFile>,
    pub denied: Vec<(UploadFile, UploadError)>,
    pub pulses: Vec<AnnotatedPulse>,
}

/// Parse file content as one pulse or a list of pulses and validate each.
pub fn extract_pulses(content: &str, devices: &[Device]) -> Result<Vec<AnnotatedPulse>, UploadError> {
    let json: serde_json::Value = serde_json::from_str(content)
        .map_err(|_| UploadError::Parse("file content is not valid JSON".to_string()))?;

    match json {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| AnnotatedPulse::validate_and_parse(item, devices))
            .collect(),
        single => Ok(vec![AnnotatedPulse::validate_and_parse(&single, devices)?]),
    }
}

/// Validate newly selected files against the already selected ones.
///
/// Files identical to an existing or earlier candidate are skipped silently.
/// Every other file ends up either accepted (with its pulses) or denied
/// with the reason.
pub fn process_upload_files(
    existing: &[UploadFile],
    candidates: Vec<UploadCandidate>,
    devices: &[Device],
    max_file_bytes: u64,
) -> UploadBatch {
    let mut batch = UploadBatch::default();

    for candidate in candidates {
        let UploadCandidate { file, content } = candidate;

        let duplicate = existing
            .iter()
            .chain(batch.accepted.iter())
            .any(|f| f.is_same_file(&file));
        if duplicate {
            debug!(file = %file.name, "Skipping already selected file");
            continue;
        }

        let result = if !file.is_json() {
            Err(UploadError::Parse("Files must be JSON-files.".to_string()))
        } else if file.size > max_file_bytes {
            Err(UploadError::TooLarge {
                size: file.size,
                limit: max_file_bytes,
            })
        } else {
            extract_pulses(&content, devices)
        };

        match result {
            Ok(pulses) => {
                debug!(file = %file.name, pulses = pulses.len(), "Accepted upload file");
                batch.pulses.extend(pulses);
                batch.accepted.push(file);
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Could not parse file");
                batch.denied.push((file, e));
            }
        }
    }

    batch
}

/// Human-readable size in decimal units, rounded to whole numbers with
/// halves rounded up.
pub fn format_file_size(bytes: u64) -> String {
    const SIZES: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 bytes".to_string();
    }

    let exponent = ((bytes as f64).log10() / 3.0).floor() as usize;
    let exponent = exponent.min(SIZES.len() - 1);
    let scaled = bytes as f64 / 1000f64.powi(exponent as i32);

    format!("{} {}", scaled.round(), SIZES[exponent])
}
