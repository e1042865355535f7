//! Lead-injection pipeline for outbound dialing
//!
//! This library periodically selects campaigns inside their calling
//! window, computes how many leads each may push into the call queue,
//! distributes that budget across the campaign's lists, and moves the
//! selected leads into the queue while marking them non-dialable.

pub mod core;
pub mod error;
pub mod injector;
pub mod leads;
pub mod rate;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use crate::core::{allocate, is_schedulable, CycleSummary, ListAvailability, ZipCodeCache};
pub use crate::injector::{Injector, InjectorConfig};
pub use crate::leads::LeadStateMachine;
pub use crate::rate::{RateCalculation, RateController};
pub use error::{InjectorError, InjectorResult};
pub use traits::{LeadStore, QueueStore};
