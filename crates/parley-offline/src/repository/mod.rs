//! Per-entity repositories composing a [`BoundedCache`] with a store DAO.
//!
//! Shared contract:
//! - `insert` is a no-op on empty input, otherwise it fills the cache first
//!   and then issues one batch upsert.
//! - batch selects read the cache once, then issue at most one batched store
//!   read for the keys that missed.  Store results are not cached, and the
//!   output order is unspecified.
//! - store errors propagate; cache operations cannot fail.

mod channel;
mod message;
mod user;

use std::collections::HashSet;

pub use channel::ChannelRepository;
pub use message::MessageRepository;
pub use user::UserRepository;

use crate::cache::BoundedCache;

/// Split `keys` into cached snapshots and the deduplicated keys that missed.
pub(crate) fn partition_cached<V: Clone>(
    cache: &BoundedCache<String, V>,
    keys: &[String],
) -> (Vec<V>, Vec<String>) {
    let mut seen = HashSet::with_capacity(keys.len());
    let mut hits = Vec::new();
    let mut misses = Vec::new();

    for key in keys {
        if !seen.insert(key.as_str()) {
            continue;
        }
        match cache.get(key) {
            Some(value) => hits.push(value),
            None => misses.push(key.clone()),
        }
    }
    (hits, misses)
}
