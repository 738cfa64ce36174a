//! Cache module for persisting feature payloads to disk
//!
//! One JSON file per feature key holds the last successfully fetched payload
//! together with the millisecond timestamp it was written at. Freshness is
//! decided by the reader against the feature's TTL; entries are never deleted,
//! only superseded by the next successful fetch.

mod manager;

pub use manager::{is_valid, CacheEntry, CacheManager};
