//! In-process key/value cache with absolute per-key expiry.
//!
//! Expired entries are removed lazily by whichever operation touches them
//! first, and periodically by a [`Sweeper`](super::Sweeper). Either path
//! alone is enough to hide an expired entry from readers.

use crate::domain_model::{now_millis, secs_to_millis};
use dashmap::DashMap;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone)]
struct Slot<V> {
    /// `None` when only an expiry was recorded through `update_ttl`.
    value: Option<V>,
    /// Epoch milliseconds; the entry is gone once `now >= expire_at`.
    expire_at: i64,
}

impl<V> Slot<V> {
    fn is_expired(&self, now: i64) -> bool {
        self.expire_at <= now
    }
}

/// Concurrent map of values and their expiry instants.
///
/// Value and expiry of a key share one `DashMap` slot, so every operation
/// on a key is atomic and operations on different shards never contend.
pub struct TtlCache<V> {
    slots: DashMap<String, Slot<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        TtlCache {
            slots: DashMap::new(),
        }
    }

    /// Store `value` for `ttl_secs` seconds. A zero TTL stores nothing and
    /// leaves any existing entry untouched.
    pub fn set(&self, key: &str, value: V, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let expire_at = now_millis().saturating_add(secs_to_millis(ttl_secs));
        self.slots.insert(
            key.to_owned(),
            Slot {
                value: Some(value),
                expire_at,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.evict_if_expired(key, now_millis());
        self.slots.get(key).and_then(|slot| slot.value.clone())
    }

    /// Replace the value of a live entry. Absent or expired keys are left
    /// absent. Returns whether the value was replaced.
    pub fn update(&self, key: &str, value: V) -> bool {
        let now = now_millis();
        self.evict_if_expired(key, now);
        match self.slots.get_mut(key) {
            Some(mut slot) if slot.value.is_some() && !slot.is_expired(now) => {
                slot.value = Some(value);
                true
            }
            _ => false,
        }
    }

    pub fn delete(&self, key: &str) {
        self.slots.remove(key);
    }

    /// Remaining lifetime in whole seconds; `None` when the key has no
    /// expiry record.
    pub fn remaining_ttl(&self, key: &str) -> Option<u64> {
        self.ttl(key).map(|remaining| remaining.as_secs())
    }

    /// Remaining lifetime with millisecond precision.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = now_millis();
        self.evict_if_expired(key, now);
        let expire_at = self.slots.get(key).map(|slot| slot.expire_at)?;
        let remaining = expire_at - now;
        if remaining <= 0 {
            self.evict_if_expired(key, now);
            return None;
        }
        Some(Duration::from_millis(remaining as u64))
    }

    /// Set the expiry of `key` to `ttl_secs` from now whether or not the key
    /// holds a value. A value that had already expired is dropped first.
    pub fn update_ttl(&self, key: &str, ttl_secs: u64) {
        let now = now_millis();
        self.evict_if_expired(key, now);
        let expire_at = now.saturating_add(secs_to_millis(ttl_secs));
        self.slots
            .entry(key.to_owned())
            .and_modify(|slot| slot.expire_at = expire_at)
            .or_insert(Slot {
                value: None,
                expire_at,
            });
    }

    /// Set the expiry of `key` to `ttl_secs` from now only if it currently
    /// holds a live value. Returns whether the expiry moved.
    pub fn touch(&self, key: &str, ttl_secs: u64) -> bool {
        let now = now_millis();
        self.evict_if_expired(key, now);
        match self.slots.get_mut(key) {
            Some(mut slot) if slot.value.is_some() && !slot.is_expired(now) => {
                slot.expire_at = now.saturating_add(secs_to_millis(ttl_secs));
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Snapshot of every key with an expiry record, live or not.
    pub fn keys(&self) -> Vec<String> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Entries holding a value, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expiry records, including expired ones not yet evicted.
    pub fn tracked_len(&self) -> usize {
        self.slots.len()
    }

    /// Evict every expired entry, one key at a time. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = now_millis();
        let candidates: Vec<String> = self
            .slots
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .iter()
            .filter(|key| self.evict_if_expired(key, now))
            .count()
    }

    fn evict_if_expired(&self, key: &str, now: i64) -> bool {
        let evicted = self
            .slots
            .remove_if(key, |_, slot| slot.is_expired(now))
            .is_some();
        if evicted {
            trace!(key, "evicted expired entry");
        }
        evicted
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
