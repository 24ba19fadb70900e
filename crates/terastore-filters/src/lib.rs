// terastore-filters - Filter recommendation engine
//
// Counts how many pulses each not-yet-applied attribute key would match
// under the current filter set, ranks keys by that count, and keeps the
// applied filters and candidate keys consistent while the user edits them.

pub mod error;
pub mod explorer;
pub mod generation;
pub mod match_count;
pub mod recommend;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{EngineError, StoreError};
pub use explorer::{Explorer, KeyOptions};
pub use generation::{Generation, GenerationCounter};
pub use match_count::{date_bounds, full_date_span, match_count, number_bounds, string_value_results};
pub use recommend::{recommend, Recommendation};
pub use store::{FilterStore, StoreSnapshot};
