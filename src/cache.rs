//! # Result Cache Module
//!
//! A bounded, thread-safe memo shared by product lookups (keyed by barcode)
//! and ingredient explanations (keyed by a prefixed, sorted ingredient list).
//! Barcode keys are digits only and explanation keys always carry the
//! `explain:` prefix, so the two key spaces never collide.
//!
//! Entries expire after a TTL and the oldest entry is evicted once the
//! capacity is reached. Concurrent writers to the same key are last-writer-wins.

use log::{debug, trace};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

/// Prefix that keeps explanation keys apart from barcode keys
pub const EXPLANATION_KEY_PREFIX: &str = "explain:";

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Bounded TTL cache keyed by string
///
/// # Examples
///
/// ```rust
/// use safe_bite::cache::ResultCache;
/// use safe_bite::config::CacheConfig;
///
/// let cache = ResultCache::new(CacheConfig::default());
/// cache.set("3017620422003", "hazelnut spread".to_string());
/// assert_eq!(cache.get("3017620422003").as_deref(), Some("hazelnut spread"));
/// ```
#[derive(Debug)]
pub struct ResultCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: config.capacity.max(1),
            ttl: Duration::from_secs(config.ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Build a cache with an explicit TTL, bypassing whole-second config
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Fetch a live entry; an expired entry is dropped and reported absent
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!("Cache hit for '{}'", key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Cache entry '{}' expired", key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or overwrite an entry, evicting expired then oldest entries when full
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            let before = entries.len();
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
            let mut evicted = (before - entries.len()) as u64;

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("Cache full ({} entries), evicting '{}'", self.capacity, oldest);
                    entries.remove(&oldest);
                    evicted += 1;
                }
            }
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cache key for a product lookup
pub fn barcode_key(barcode: &str) -> String {
    barcode.trim().to_string()
}

/// Cache key for an explanation request: order- and case-insensitive
pub fn explanation_key<S: AsRef<str>>(ingredients: &[S]) -> String {
    let mut names: Vec<String> = ingredients
        .iter()
        .map(|name| name.as_ref().trim().to_lowercase())
        .collect();
    names.sort();
    format!("{EXPLANATION_KEY_PREFIX}{}", names.join("|"))
}
