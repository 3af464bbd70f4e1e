use std::time::{Duration, Instant};

use crate::snap::engine::Guide;

/// How long guides stay visible after the pointer is released.
pub const GUIDE_LINGER: Duration = Duration::from_secs(1);

/// Guides shown during a drag; ephemeral session state only.
#[derive(Clone, Debug, Default)]
pub struct GuideOverlay {
    guides: Vec<Guide>,
    clear_at: Option<Instant>,
}

impl GuideOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible guides while dragging.
    pub fn show(&mut self, guides: Vec<Guide>) {
        self.guides = guides;
        self.clear_at = None;
    }

    /// Pointer released: keep the guides for [`GUIDE_LINGER`].
    pub fn release(&mut self, now: Instant) {
        if !self.guides.is_empty() {
            self.clear_at = Some(now + GUIDE_LINGER);
        }
    }

    /// Drop guides whose linger time has passed. Returns true if anything was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.clear_at {
            Some(at) if now >= at => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.guides.clear();
        self.clear_at = None;
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }
}
