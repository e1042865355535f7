//! Environment-style configuration for the store collaborators
//!
//! Every accessor falls back to a documented default when the variable is
//! unset, so a bare development environment still points at sane local
//! endpoints.

use std::env;

/// Contact points for the record store cluster.
///
/// `CASSANDRA_CONTACT_POINTS` is a comma-separated list of `host:port`
/// entries; defaults to a single `cassandra-node1:9042` node.
pub fn cassandra_contact_points() -> Vec<String> {
    match env::var("CASSANDRA_CONTACT_POINTS") {
        Ok(value) if !value.trim().is_empty() => value
            .split(',')
            .map(|point| point.trim().to_string())
            .filter(|point| !point.is_empty())
            .collect(),
        _ => vec!["cassandra-node1:9042".to_string()],
    }
}

/// Keyspace holding the campaign/list/lead tables.
///
/// `CASSANDRA_KEYSPACE`, default `pluralistmanagement`.
pub fn cassandra_keyspace() -> String {
    match env::var("CASSANDRA_KEYSPACE") {
        Ok(keyspace) if !keyspace.trim().is_empty() => keyspace,
        _ => "pluralistmanagement".to_string(),
    }
}

/// Address of the counter/queue store.
///
/// `REDIS_ADDR`, default `127.0.0.1:6379`.
pub fn redis_addr() -> String {
    match env::var("REDIS_ADDR") {
        Ok(addr) if !addr.trim().is_empty() => addr,
        _ => "127.0.0.1:6379".to_string(),
    }
}

/// Password for the counter/queue store; empty when authentication is
/// disabled. `REDIS_PASSWORD`.
pub fn redis_password() -> String {
    env::var("REDIS_PASSWORD").unwrap_or_default()
}

/// Connection URL for the counter/queue store, composed from
/// [`redis_addr`] and [`redis_password`].
pub fn redis_url() -> String {
    let password = redis_password();
    if password.is_empty() {
        format!("redis://{}", redis_addr())
    } else {
        format!("redis://:{}@{}", password, redis_addr())
    }
}
