//! One-way lifecycle state for long-lived services.
//!
//! ```text
//! Uninitialized ──begin_start──▶ Starting ──finish_start──▶ Ready ──stop──▶ Stopped
//!       ▲                           │
//!       └────────abort_start────────┘
//! ```
//!
//! Every transition is a single compare-exchange, so exactly one caller wins
//! each edge. `Stopped` is terminal.

use core::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized = 0,
    Starting = 1,
    Ready = 2,
    Stopped = 3,
}

impl Lifecycle {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Lifecycle::Uninitialized,
            1 => Lifecycle::Starting,
            2 => Lifecycle::Ready,
            _ => Lifecycle::Stopped,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Starting => "starting",
            Lifecycle::Ready => "ready",
            Lifecycle::Stopped => "stopped",
        }
    }
}

impl core::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct LifecycleFlag {
    state: AtomicU8,
}

impl LifecycleFlag {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(Lifecycle::Uninitialized as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> Lifecycle {
        Lifecycle::from_raw(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.get() == Lifecycle::Ready
    }

    #[inline]
    fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the startup sequence. Returns false if another caller holds it
    /// or the service already left `Uninitialized`.
    pub fn begin_start(&self) -> bool {
        self.transition(Lifecycle::Uninitialized, Lifecycle::Starting)
    }

    /// Publish a successful startup.
    pub fn finish_start(&self) -> bool {
        self.transition(Lifecycle::Starting, Lifecycle::Ready)
    }

    /// Roll a failed startup back to `Uninitialized`.
    pub fn abort_start(&self) -> bool {
        self.transition(Lifecycle::Starting, Lifecycle::Uninitialized)
    }

    /// Enter the terminal state. Only a ready service can stop.
    pub fn stop(&self) -> bool {
        self.transition(Lifecycle::Ready, Lifecycle::Stopped)
    }
}

impl Default for LifecycleFlag {
    fn default() -> Self {
        Self::new()
    }
}
