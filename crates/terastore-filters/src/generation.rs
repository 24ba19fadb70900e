//! Generation tokens for dropping superseded results.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic version of some piece of state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Shared counter handing out a new generation per request.
///
/// A result computed for generation `g` is only applied while `g` is still
/// current; anything started before a newer request is discarded.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}
