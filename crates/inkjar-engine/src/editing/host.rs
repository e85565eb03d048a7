//! The window-equivalent the editor runs inside: a clock for debounce timers
//! and the capability flags detected once at construction.

use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Host {
    fn now(&self) -> Instant;

    /// Whether the host supports precise caret placement on plain-text
    /// editable surfaces. Hosts without it run the editor in legacy mode.
    fn supports_plaintext_only(&self) -> bool {
        true
    }
}

/// Real clock, full capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A host whose clock only moves when told to.
#[derive(Debug)]
pub struct ManualHost {
    now: Cell<Instant>,
    plaintext_only: bool,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
            plaintext_only: true,
        }
    }

    /// A host lacking plain-text caret support.
    pub fn legacy() -> Self {
        Self {
            plaintext_only: false,
            ..Self::new()
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Host for ManualHost {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn supports_plaintext_only(&self) -> bool {
        self.plaintext_only
    }
}
