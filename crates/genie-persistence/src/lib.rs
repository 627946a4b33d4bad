//! genie-persistence: the `Store` implementation (spec §4.6, component C1).
//!
//! Mirrors the role `chem-persistence` played for the teacher, minus the
//! Postgres/Diesel machinery: the session model, the distributed lock, and
//! the progress counters all live in Redis, matching the backend the
//! original Python implementation (`examples/original_source/genie_flow/session_lock.py`,
//! `store.py`) actually used. `config` carries the same `from_env` +
//! lazily-loaded-`.env` convention the teacher's `chem-persistence::config`
//! used for its database URL.

pub mod config;
pub mod guard;
pub mod keys;
pub mod memory_store;
pub mod redis_store;
pub mod serialization;

pub use config::GenieRedisConfig;
pub use guard::SessionGuard;
pub use memory_store::InMemoryStore;
pub use redis_store::RedisStore;
