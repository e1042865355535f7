//! Core business logic modules
//!
//! Pure, deterministic pieces of the pipeline with no store I/O: schedule
//! evaluation, proportional allocation, the zip-code timezone cache, and
//! per-cycle state tracking.

pub mod allocation;
pub mod schedule;
pub mod state;
pub mod timezone;

pub use allocation::{allocate, ListAvailability};
pub use schedule::is_schedulable;
pub use state::{CycleSummary, InjectorState};
pub use timezone::{ZipCodeCache, ZipCodeInfo};
