//! Cache module for Redis-based caching
//!
//! Provides the Redis client backing the answer cache pre-check, with retry
//! logic for transient failures.

pub mod redis_client;


pub use redis_client::RedisClient;

// Re-export commonly used types
pub use wu_shared::config::CacheConfig;
