// terastore-core - Domain model for the TeraStore client
//
// Attribute keys, pulse filters, filter results, pulses and upload
// validation. No I/O, no async, no runtime dependencies: everything that
// talks to the backend lives in terastore-client.

pub mod attr;
pub mod error;
pub mod filter;
pub mod filter_result;
pub mod pulse;
pub mod upload;
pub mod user;

pub use attr::{AttrKey, AttrKind, AttrValue, CREATION_DATE_KEY};
pub use error::{CoreError, ErrorCode, UploadError};
pub use filter::{canonical_order, BackendFilter, DateFilter, NumberFilter, PulseFilter, StringFilter};
pub use filter_result::{FilterResult, PulseId, PulseMetadata};
pub use pulse::{
    parse_timestamp, AnnotatedPulse, BackendAttribute, Device, Pulse, PulseAttribute, PulseCreate, Signal,
};
pub use upload::{
    extract_pulses, format_file_size, process_upload_files, UploadBatch, UploadCandidate, UploadFile,
    DEFAULT_MAX_FILE_BYTES,
};
pub use user::{AuthLevel, User};
