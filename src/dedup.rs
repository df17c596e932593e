//! Bounded relay-id cache with TTL and max-size eviction.
//!
//! Remembers which events have already been relayed so repeated scans over
//! the same block window do not submit duplicate calls. Ids fall out of the
//! cache by TTL or by capacity, which keeps memory flat under long watch
//! runs; the chain itself remains the backstop for anything evicted early.

use std::collections::HashMap;
use std::env;
use std::time::{Duration, Instant};

const DEFAULT_RELAY_CACHE_SIZE: usize = 100_000;
const DEFAULT_RELAY_CACHE_TTL_SECS: u64 = 86_400; // 24 hours

/// Read cache configuration from environment variables with defaults.
pub struct CacheConfig {
    pub size: usize,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            size: env::var("RELAY_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RELAY_CACHE_SIZE),
            ttl_secs: env::var("RELAY_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RELAY_CACHE_TTL_SECS),
        }
    }
}

/// Bounded cache of 32-byte relay ids.
///
/// - **Max capacity:** when full, the oldest entry is evicted on insert.
/// - **TTL:** expired entries are dropped before insertion and ignored on
///   lookup.
pub struct RelayCache {
    map: HashMap<[u8; 32], Instant>,
    max_size: usize,
    ttl: Duration,
}

impl RelayCache {
    pub fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            map: HashMap::new(),
            max_size,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn from_env() -> Self {
        let config = CacheConfig::from_env();
        Self::new(config.size, config.ttl_secs)
    }

    pub fn contains(&self, id: &[u8; 32]) -> bool {
        self.map.get(id).is_some_and(|&t| t.elapsed() < self.ttl)
    }

    pub fn insert(&mut self, id: [u8; 32]) {
        let now = Instant::now();
        self.map
            .retain(|_, &mut t| now.duration_since(t) < self.ttl);
        while self.map.len() >= self.max_size && !self.map.is_empty() {
            let oldest = self.map.iter().min_by_key(|(_, t)| *t).map(|(h, _)| *h);
            if let Some(h) = oldest {
                self.map.remove(&h);
            } else {
                break;
            }
        }
        self.map.insert(id, now);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}
