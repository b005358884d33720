//! Clock Port - Monotonic time source.
//!
//! Flush throttling reads time only through this port so tests can drive
//! it by hand instead of sleeping.

use std::time::Instant;

/// Source of monotonic instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
