//! Held-key bookkeeping for the four logical directions.

use monolake_core::{Direction, InputSnapshot};

/// Currently held directions, updated by edge-triggered input notifications.
///
/// Only the latest held state is kept; edges are never queued. The world
/// copies the flags into an [`InputSnapshot`] once per tick so every system
/// observes the same combination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    held: InputSnapshot,
}

impl InputState {
    /// Records a key-down (`held == true`) or key-up edge.
    ///
    /// Returns whether the held state actually changed.
    pub(crate) fn set(&mut self, direction: Direction, held: bool) -> bool {
        if self.held.is_held(direction) == held {
            return false;
        }
        self.held = self.held.with(direction, held);
        true
    }

    /// Copies the held flags.
    #[must_use]
    pub const fn snapshot(&self) -> InputSnapshot {
        self.held
    }
}
