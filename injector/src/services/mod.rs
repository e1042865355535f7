//! Concrete store integrations
//!
//! `CassandraLeadStore` backs the lead/campaign tables with a CQL
//! cluster; `RedisQueueStore` backs the call queues and live counters
//! with Redis.

pub mod cassandra;
pub mod redis_queue;

pub use cassandra::CassandraLeadStore;
pub use redis_queue::RedisQueueStore;
