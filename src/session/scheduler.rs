//! Next-frame render debouncing.
//!
//! Mutations call [`FrameScheduler::request`]; the host calls [`FrameScheduler::on_frame`] from
//! its frame callback and [`FrameScheduler::poll_fallback`] from a timer. Any number of requests
//! between two frames collapse into one repaint, and the fallback timer fires the repaint when the
//! frame callback is starved (hidden tabs, throttled hosts).

use std::time::{Duration, Instant};

/// Fallback delay used when no frame callback arrives.
pub const DEFAULT_FALLBACK: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct FrameScheduler {
    fallback: Duration,
    requested_at: Option<Instant>,
    coalesced: u64,
    renders: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK)
    }
}

impl FrameScheduler {
    #[must_use]
    pub fn new(fallback: Duration) -> Self {
        Self {
            fallback,
            requested_at: None,
            coalesced: 0,
            renders: 0,
        }
    }

    /// Ask for a repaint. Returns `true` when this request scheduled a new frame and `false` when
    /// it joined one already pending.
    pub fn request(&mut self, now: Instant) -> bool {
        if self.requested_at.is_some() {
            self.coalesced += 1;
            return false;
        }
        self.requested_at = Some(now);
        true
    }

    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.requested_at.is_some()
    }

    /// Frame callback fired. Returns `true` when a repaint is due.
    pub fn on_frame(&mut self) -> bool {
        self.take()
    }

    /// Timer tick. Returns `true` when the pending repaint has waited past the fallback delay.
    pub fn poll_fallback(&mut self, now: Instant) -> bool {
        match self.requested_at {
            Some(at) if now.saturating_duration_since(at) >= self.fallback => self.take(),
            _ => false,
        }
    }

    fn take(&mut self) -> bool {
        if self.requested_at.take().is_some() {
            self.renders += 1;
            true
        } else {
            false
        }
    }

    /// Requests folded into an already pending frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Repaints released so far.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }
}
