//! Response cache: content-addressed answers with time-based expiry.
//!
//! The key is a SHA-256 digest of (normalized question, role, sections in
//! canonical order), so the order in which sections were classified never
//! changes the key. Expiry is lazy: `get` rejects and removes stale entries
//! itself, and `clear_expired` scans the whole store on demand.
//!
//! Storage failures never reach the caller. A failed read is a miss, a failed
//! write reports `false`, and both are logged.

pub mod handlers;
pub mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::classifier::normalize_question;
use crate::clock::Clock;
use crate::models::Section;

pub use store::{EntryStore, FileStore, MemoryStore};

/// Stored record. Self-describing so a cache directory can be audited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub question: String,
    pub role: String,
    /// Canonical (sorted, distinct) section list the answer was grounded on.
    pub relevant_fields: Vec<Section>,
    pub answer: String,
    pub factual_data: Value,
    pub created_at: DateTime<Utc>,
    pub cache_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Percentage of lookups that hit, rounded to two decimals.
    pub hit_rate: f64,
    /// Records currently in the store, including expired ones not yet reaped.
    pub entry_count: usize,
    pub max_age_seconds: u64,
}

fn canonical_sections(sections: &[Section]) -> Vec<Section> {
    let mut canonical = sections.to_vec();
    canonical.sort();
    canonical.dedup();
    canonical
}

/// Derives the cache key. Fields are length-prefixed so that separators inside
/// a question cannot make two different inputs hash alike.
pub fn cache_key(question: &str, role: &str, sections: &[Section]) -> String {
    let normalized = normalize_question(question);
    let sections = canonical_sections(sections)
        .iter()
        .map(Section::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha256::new();
    for field in [normalized.as_str(), role, sections.as_str()] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn preview(question: &str) -> String {
    question.chars().take(50).collect()
}

pub struct ResponseCache {
    store: Box<dyn EntryStore>,
    max_age: chrono::Duration,
    max_age_seconds: u64,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResponseCache {
    pub fn new(store: Box<dyn EntryStore>, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            max_age: chrono::Duration::from_std(max_age)
                .unwrap_or_else(|_| chrono::Duration::days(365 * 100)),
            max_age_seconds: max_age.as_secs(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, question: &str, role: &str, sections: &[Section]) -> Option<CacheEntry> {
        let key = cache_key(question, role, sections);

        let entry = match self.store.load(&key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if self.is_expired(&entry, self.clock.now()) {
            if let Err(e) = self.store.remove(&key) {
                warn!(key = %key, error = %e, "Failed to remove expired cache entry");
            }
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(question_preview = %preview(question), "Cache hit");
        Some(entry)
    }

    /// Stores (or overwrites) the answer for this key with a fresh timestamp.
    pub fn set(
        &self,
        question: &str,
        role: &str,
        sections: &[Section],
        answer: &str,
        factual_data: Value,
    ) -> bool {
        let cache_key = cache_key(question, role, sections);
        let entry = CacheEntry {
            question: question.to_string(),
            role: role.to_string(),
            relevant_fields: canonical_sections(sections),
            answer: answer.to_string(),
            factual_data,
            created_at: self.clock.now(),
            cache_key,
        };

        match self.store.save(&entry) {
            Ok(()) => {
                debug!(question_preview = %preview(question), "Cache set");
                true
            }
            Err(e) => {
                warn!(key = %entry.cache_key, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Removes every stored entry older than the max age. Unreadable entries
    /// are skipped, not removed.
    pub fn clear_expired(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Cache scan failed");
                return 0;
            }
        };

        let now = self.clock.now();
        let mut removed = 0;
        for key in keys {
            match self.store.load(&key) {
                Ok(Some(entry)) if self.is_expired(&entry, now) => match self.store.remove(&key) {
                    Ok(true) => removed += 1,
                    Ok(false) => {}
                    Err(e) => warn!(key = %key, error = %e, "Failed to remove expired cache entry"),
                },
                Ok(_) => {}
                Err(e) => debug!(key = %key, error = %e, "Skipping unreadable cache entry"),
            }
        }

        if removed > 0 {
            info!(removed, "Removed expired cache entries");
        }
        removed
    }

    /// Removes every stored entry, readable or not.
    pub fn clear_all(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Cache scan failed");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.store.remove(&key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to remove cache entry"),
            }
        }
        info!(removed, "Cleared cache");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let evictions = self.evictions.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        let entry_count = self.store.keys().map(|keys| keys.len()).unwrap_or_else(|e| {
            warn!(error = %e, "Cache scan failed");
            0
        });

        CacheStats {
            hits,
            misses,
            evictions,
            hit_rate,
            entry_count,
            max_age_seconds: self.max_age_seconds,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.max_age
    }
}

/// Runs `f` against the cache on the blocking pool. A file-backed store does
/// synchronous I/O, and a scan reads every entry.
pub async fn offload<T, F>(cache: &Arc<ResponseCache>, f: F) -> Result<T, JoinError>
where
    F: FnOnce(&ResponseCache) -> T + Send + 'static,
    T: Send + 'static,
{
    let cache = cache.clone();
    tokio::task::spawn_blocking(move || f(&cache)).await
}

/// Start a background task that reaps expired entries every `every`.
///
/// Only keeps the store small; `get` rejects stale entries on its own.
pub fn start_periodic_sweep(
    cache: Arc<ResponseCache>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // skip first immediate tick

        loop {
            interval.tick().await;
            match offload(&cache, ResponseCache::clear_expired).await {
                Ok(removed) => debug!(removed, "Periodic cache sweep finished"),
                Err(e) => warn!(error = %e, "Periodic cache sweep failed"),
            }
        }
    })
}
