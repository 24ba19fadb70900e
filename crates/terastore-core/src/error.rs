//! Error types for the domain model and upload validation.

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E101: Upload file is not valid JSON or does not match the pulse schema
    E101ParseFailure,
    /// E102: Creation timestamp could not be parsed
    E102InvalidCreationTime,
    /// E103: Pulse references a device the backend does not know
    E103InvalidDevice,
    /// E104: Upload file exceeds the configured size limit
    E104FileTooLarge,
    /// E201: Backend reported an attribute kind this client does not handle
    E201UnhandledAttrKind,
    /// E202: Range filter with lower bound above upper bound
    E202InvertedRange,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E101ParseFailure => "E101",
            Self::E102InvalidCreationTime => "E102",
            Self::E103InvalidDevice => "E103",
            Self::E104FileTooLarge => "E104",
            Self::E201UnhandledAttrKind => "E201",
            Self::E202InvertedRange => "E202",
        }
    }

    /// Short hint shown next to user-facing errors.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::E101ParseFailure => Some("fix the file and upload it again"),
            Self::E102InvalidCreationTime => {
                Some("creation_time must be an ISO-8601 timestamp, e.g. 2023-11-19T01:30:10.175Z")
            }
            Self::E103InvalidDevice => Some("register the device first or correct device_id"),
            Self::E104FileTooLarge => Some("split the file into smaller files"),
            Self::E201UnhandledAttrKind | Self::E202InvertedRange => None,
        }
    }
}

/// Contract violations in the domain model.
///
/// These indicate a programming error or a backend speaking a newer protocol;
/// they are propagated, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("[E201] Unhandled pulse attribute key type: \"{0}\"")]
    UnhandledAttrKind(String),

    #[error("[E202] Invalid range for '{key}': lower bound {lower} is above upper bound {upper}")]
    InvertedRange {
        key: String,
        lower: String,
        upper: String,
    },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnhandledAttrKind(_) => ErrorCode::E201UnhandledAttrKind,
            Self::InvertedRange { .. } => ErrorCode::E202InvertedRange,
        }
    }
}

/// Errors raised while validating an uploaded pulse file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("[E101] {0}")]
    Parse(String),

    #[error("[E102] Failed to parse creation_time: {0}")]
    InvalidCreationTime(String),

    #[error("[E103] Device ID {0} does not exist.")]
    InvalidDevice(String),

    #[error("[E104] File is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl UploadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::E101ParseFailure,
            Self::InvalidCreationTime(_) => ErrorCode::E102InvalidCreationTime,
            Self::InvalidDevice(_) => ErrorCode::E103InvalidDevice,
            Self::TooLarge { .. } => ErrorCode::E104FileTooLarge,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
