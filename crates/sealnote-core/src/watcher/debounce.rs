//! Per-key debounce bookkeeping, independent of threads and clocks.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Coalesces repeated events per key until the key has been quiet for `window`.
#[derive(Debug)]
pub struct Debouncer<K> {
    window: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an event at `now`, pushing the key's deadline to `now + window`.
    pub fn record(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now + self.window);
    }

    /// Earliest deadline among pending keys.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`.
    pub fn take_expired(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.pending.remove(key);
        }
        expired
    }

    /// Drop every pending key without firing it; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
