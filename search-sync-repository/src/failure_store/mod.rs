//! Durable TTL set backends for the failure queue.
//!
//! - [`RedisFailureStore`]: one Redis key per id, expired by Redis itself
//! - [`InMemoryFailureStore`]: process-local, for tests and single-node setups

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryFailureStore;
pub use redis_store::RedisFailureStore;
