//! Trailing-edge debounce.
//!
//! A [`Debounce`] owns a delay and an action over some context `C`. Every
//! [`schedule`](Debounce::schedule) cancels whatever was pending and restarts
//! the window; the action runs once the window elapses with no further
//! scheduling, receiving the most recent argument. Time comes from the
//! caller, so the owner decides which clock drives it.

use std::time::{Duration, Instant};

pub struct Debounce<C, T> {
    delay: Duration,
    action: fn(&mut C, T),
    pending: Option<(Instant, T)>,
}

impl<C, T> Debounce<C, T> {
    pub fn new(delay: Duration, action: fn(&mut C, T)) -> Self {
        Self {
            delay,
            action,
            pending: None,
        }
    }

    /// Cancel any pending run and schedule a new one `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, arg: T) {
        self.pending = Some((now + self.delay, arg));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the pending run if its deadline has passed, returning the action
    /// to invoke with its argument.
    pub fn take_due(&mut self, now: Instant) -> Option<(fn(&mut C, T), T)> {
        match self.pending.take() {
            Some((deadline, arg)) if deadline <= now => Some((self.action, arg)),
            other => {
                self.pending = other;
                None
            }
        }
    }
}
