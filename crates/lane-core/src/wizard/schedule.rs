//! Cancellable timers for debounced autosave.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle to a scheduled timer; passing it to [`Scheduler::cancel`] disarms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Source of one-shot timers.
///
/// Timers do not run callbacks. The owner asks for expired tokens and runs
/// the associated work itself, which keeps every mutation on the owner's
/// thread.
pub trait Scheduler {
    /// Arms a timer that expires after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerToken;

    /// Disarms a timer. Unknown or already expired tokens are ignored.
    fn cancel(&mut self, token: TimerToken);

    /// Removes and returns every timer whose deadline has passed.
    fn take_expired(&mut self) -> Vec<TimerToken>;
}

/// Scheduler driven by a manually advanced clock, for deterministic tests.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    next_token: u64,
    timers: BTreeMap<TimerToken, Duration>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the virtual clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Time elapsed on the virtual clock.
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.timers.insert(token, self.now + delay);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.remove(&token);
    }

    fn take_expired(&mut self) -> Vec<TimerToken> {
        let now = self.now;
        let expired: Vec<_> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(token, _)| *token)
            .collect();
        for token in &expired {
            self.timers.remove(token);
        }
        expired
    }
}

/// Scheduler backed by the monotonic system clock.
#[derive(Debug, Default)]
pub struct SystemScheduler {
    next_token: u64,
    timers: BTreeMap<TimerToken, Instant>,
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for SystemScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.timers.insert(token, Instant::now() + delay);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.remove(&token);
    }

    fn take_expired(&mut self) -> Vec<TimerToken> {
        let now = Instant::now();
        let expired: Vec<_> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(token, _)| *token)
            .collect();
        for token in &expired {
            self.timers.remove(token);
        }
        expired
    }
}
