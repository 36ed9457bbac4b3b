//! # Document Cache
//!
//! Cache contract consumed by the services, the key-space convention that
//! makes coarse pattern invalidation possible, and an in-memory cache.

pub mod errors;
pub mod keys;
pub mod backend;
pub mod memory;

pub use errors::{CacheError, CacheResult};
pub use keys::{glob_match, CacheKey, KeyPattern};
pub use backend::DocumentCache;
pub use memory::InMemoryCache;
