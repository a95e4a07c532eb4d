//! Access Predictor Module
//!
//! Tracks per-key access timestamps and estimates future reuse.
//!
//! Prediction is a renewal-process estimate: the next access is expected one
//! mean inter-access interval after the last one. Popularity is a
//! recency-weighted count where each access contributes
//! `1 / (1 + hours_since_access)`.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::lru::LruTracker;

/// Rolling window of history kept per key.
pub const HISTORY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Accesses required before a key gets a prediction.
pub const MIN_ACCESSES_FOR_PREDICTION: usize = 3;

const MS_PER_HOUR: f64 = 3_600_000.0;

// == Access Predictor ==
/// Per-key access history with a cap on the number of tracked keys.
///
/// History timestamps are appended in real time and so stay sorted. When the
/// key cap is reached, the key whose last access is oldest loses its history.
#[derive(Debug)]
pub struct AccessPredictor {
    /// Access timestamps (Unix milliseconds), oldest first
    histories: HashMap<String, VecDeque<u64>>,
    /// Recency of tracked keys, used to enforce `max_keys`
    tracked: LruTracker,
    max_keys: usize,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl AccessPredictor {
    /// Creates a predictor tracking at most `max_keys` keys on the system clock.
    pub fn new(max_keys: usize) -> Self {
        Self::with_clock(max_keys, Arc::new(SystemClock))
    }

    pub fn with_clock(max_keys: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            histories: HashMap::new(),
            tracked: LruTracker::new(),
            max_keys: max_keys.max(1),
            window_ms: HISTORY_WINDOW.as_millis() as u64,
            clock,
        }
    }

    // == Record Access ==
    /// Appends the current time to the key's history and prunes it to the window.
    pub fn record_access(&mut self, key: &str) {
        let now = self.clock.now_ms();

        if !self.histories.contains_key(key) && self.histories.len() >= self.max_keys {
            if let Some(stale) = self.tracked.evict_oldest() {
                self.histories.remove(&stale);
            }
        }

        let history = self.histories.entry(key.to_string()).or_default();
        // Keep the sequence non-decreasing even if the wall clock steps back
        let stamp = history.back().map_or(now, |&last| last.max(now));
        history.push_back(stamp);
        Self::prune(history, now, self.window_ms);
        self.tracked.touch(key, now);
    }

    // == Will Likely Be Accessed ==
    /// Predicts whether `key` will be accessed again within `within`.
    ///
    /// Keys with fewer than three accesses in the window have no usable
    /// interval and always return `false`.
    pub fn will_likely_be_accessed(&mut self, key: &str, within: Duration) -> bool {
        let now = self.clock.now_ms();
        let Some(history) = self.histories.get_mut(key) else {
            return false;
        };
        Self::prune(history, now, self.window_ms);

        if history.len() < MIN_ACCESSES_FOR_PREDICTION {
            return false;
        }
        let (Some(&first), Some(&last)) = (history.front(), history.back()) else {
            return false;
        };

        let mean_interval = (last - first) as f64 / (history.len() - 1) as f64;
        let predicted_next = last as f64 + mean_interval;

        predicted_next - now as f64 <= within.as_millis() as f64
    }

    // == Popular Keys ==
    /// Returns up to `limit` keys ranked by recency-weighted access count.
    pub fn popular_keys(&mut self, limit: usize) -> Vec<String> {
        self.popular_keys_scored(limit)
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    /// Like [`popular_keys`](Self::popular_keys), with each key's score.
    ///
    /// Keys whose whole history fell out of the window are forgotten. Equal
    /// scores are ordered by key.
    pub fn popular_keys_scored(&mut self, limit: usize) -> Vec<(String, f64)> {
        let now = self.clock.now_ms();
        let window_ms = self.window_ms;

        let mut emptied = Vec::new();
        let mut scored: Vec<(String, f64)> = Vec::with_capacity(self.histories.len());
        for (key, history) in self.histories.iter_mut() {
            Self::prune(history, now, window_ms);
            if history.is_empty() {
                emptied.push(key.clone());
                continue;
            }
            let score = history
                .iter()
                .map(|&ts| {
                    let hours = now.saturating_sub(ts) as f64 / MS_PER_HOUR;
                    1.0 / (1.0 + hours)
                })
                .sum::<f64>();
            scored.push((key.clone(), score));
        }

        for key in emptied {
            self.forget(&key);
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        scored
    }

    /// Number of accesses currently in the window for `key`.
    pub fn access_count(&self, key: &str) -> usize {
        self.histories.get(key).map_or(0, VecDeque::len)
    }

    /// Drops all history for `key`.
    pub fn forget(&mut self, key: &str) {
        self.histories.remove(key);
        self.tracked.remove(key);
    }

    /// Drops the history of every key matching `pred`, returning how many.
    pub fn forget_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .histories
            .keys()
            .filter(|key| pred(key))
            .cloned()
            .collect();
        for key in &doomed {
            self.forget(key);
        }
        doomed.len()
    }

    /// Number of keys with history.
    pub fn tracked_keys(&self) -> usize {
        self.histories.len()
    }

    fn prune(history: &mut VecDeque<u64>, now: u64, window_ms: u64) {
        let cutoff = now.saturating_sub(window_ms);
        while history.front().is_some_and(|&ts| ts < cutoff) {
            history.pop_front();
        }
    }
}
