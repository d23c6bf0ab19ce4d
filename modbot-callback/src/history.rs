//! Time-ordered record of stored keys, used to expire old callback data.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct CallbackHistory {
    queue: VecDeque<(DateTime<Utc>, u64)>,
}

impl CallbackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, key: u64) {
        self.enqueue_at(Utc::now(), key);
    }

    /// Records `key` at `at`. Callers keep timestamps non-decreasing.
    pub fn enqueue_at(&mut self, at: DateTime<Utc>, key: u64) {
        self.queue.push_back((at, key));
    }

    /// Removes and returns the keys stamped strictly before `cutoff`, oldest first.
    pub fn pop_before(&mut self, cutoff: DateTime<Utc>) -> Vec<u64> {
        let idx = self.queue.partition_point(|(at, _)| *at < cutoff);
        self.queue.drain(..idx).map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
