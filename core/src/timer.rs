use alloc::vec::Vec;
use web_time::Instant;

use crate::*;

/// Deadline queue for hosts that poll an event loop instead of owning native timers.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
    entries: Vec<(Instant, HoldTimer)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, timer: HoldTimer) {
        self.entries.push((now + timer.delay, timer));
    }

    /// Earliest deadline among timers that can still have an effect.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .iter()
            .filter(|(_, timer)| !timer.token.is_cancelled())
            .map(|&(deadline, _)| deadline)
            .min()
    }

    /// Removes and returns the earliest timer due at `now`. Cancelled timers are dropped on the
    /// way and never returned.
    pub fn pop_due(&mut self, now: Instant) -> Option<HoldTimer> {
        loop {
            let index = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, (deadline, _))| *deadline <= now)
                .min_by_key(|(_, (deadline, _))| *deadline)
                .map(|(index, _)| index)?;

            let (_, timer) = self.entries.swap_remove(index);
            if timer.token.is_cancelled() {
                log::trace!("dropping cancelled hold timer for {:?}", timer.cell);
                continue;
            }
            return Some(timer);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
