//! Common test utilities and infrastructure
//!
//! Shared fixtures and in-memory store fakes used across the injector
//! test suites.

pub mod fixtures;
pub mod stores;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use stores::{InMemoryLeadStore, InMemoryQueueStore};
