//! Shared types for the lead-injection pipeline
//!
//! Contains the domain records read from the record store, the transit
//! shape written to the call queue, environment configuration, and logging
//! setup. Component-internal types (rate calculations, allocation inputs)
//! are kept in their respective components.

pub mod config;
pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
