//! Timing for implicit saves.
//!
//! Two triggers feed the same autosave: a trailing-edge debounce that each
//! edit pushes back, and a coarse repeating poll that bounds how stale the
//! durable copy can get. Time is always passed in by the caller.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveTiming {
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for AutosaveTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1200),
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Which triggers were due on a given tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTriggers {
    pub debounce: bool,
    pub poll: bool,
}

impl DueTriggers {
    pub fn any(&self) -> bool {
        self.debounce || self.poll
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    timing: AutosaveTiming,
    pending: Option<Instant>,
    next_poll: Instant,
}

impl AutosaveScheduler {
    pub fn new(timing: AutosaveTiming, now: Instant) -> Self {
        Self {
            timing,
            pending: None,
            next_poll: now + timing.poll_interval,
        }
    }

    /// (Re)starts the debounce window; an earlier pending deadline is dropped.
    pub fn arm(&mut self, now: Instant) {
        self.pending = Some(now + self.timing.debounce);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes every trigger due at `now`.
    pub fn take_due(&mut self, now: Instant) -> DueTriggers {
        let mut due = DueTriggers::default();

        if self.pending.is_some_and(|deadline| deadline <= now) {
            self.pending = None;
            due.debounce = true;
        }

        if self.next_poll <= now {
            due.poll = true;
            // Skip missed ticks instead of firing them back to back.
            while self.next_poll <= now {
                self.next_poll += self.timing.poll_interval;
            }
        }

        due
    }

    /// Earliest instant at which `take_due` can report something.
    pub fn next_deadline(&self) -> Instant {
        match self.pending {
            Some(deadline) => deadline.min(self.next_poll),
            None => self.next_poll,
        }
    }
}
