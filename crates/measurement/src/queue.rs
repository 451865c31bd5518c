//! Hit queue with empty → non-empty transition detection.

use crate::hit::Hit;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct QueueState {
    hits: Vec<Hit>,
    /// A flush timer is pending for the current window.
    armed: bool,
}

/// Pending hits plus the flag for the flush timer, under one lock.
#[derive(Debug, Default)]
pub struct HitQueue {
    state: Mutex<QueueState>,
}

impl HitQueue {
    /// Create a new hit queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a hit to the tail of the queue.
    ///
    /// Returns `true` when this append found the queue empty with no timer
    /// pending. The flag is set before returning, so exactly one of any number
    /// of racing appends gets `true` and must arm the scheduler.
    pub fn append(&self, hit: Hit) -> bool {
        let mut state = self.lock();
        let was_empty = state.hits.is_empty();
        state.hits.push(hit);

        if was_empty && !state.armed {
            state.armed = true;
            return true;
        }
        false
    }

    /// Remove and return every pending hit.
    pub fn drain(&self) -> Vec<Hit> {
        std::mem::take(&mut self.lock().hits)
    }

    /// Drain on behalf of a firing timer: also clears the armed flag, so the
    /// next append starts a new window.
    pub fn take_for_flush(&self) -> Vec<Hit> {
        let mut state = self.lock();
        state.armed = false;
        std::mem::take(&mut state.hits)
    }

    /// Get the number of hits in the queue.
    pub fn len(&self) -> usize {
        self.lock().hits.len()
    }

    /// Check if the queue is empty.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a flush timer is pending.
    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.lock().armed
    }
}
