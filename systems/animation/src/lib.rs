#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Animation selection system that maps movement states onto crossfaded clips.

use std::time::Duration;

use monolake_core::{AnimationClip, Command, Event, MovementState, CROSSFADE_DURATION};

/// Pure system that requests a crossfade whenever the movement state changes.
#[derive(Debug)]
pub struct AnimationSelector {
    selected: Option<AnimationClip>,
    blend: Duration,
}

impl AnimationSelector {
    /// Creates a selector that blends clips over the provided duration.
    #[must_use]
    pub const fn with_blend(blend: Duration) -> Self {
        Self {
            selected: None,
            blend,
        }
    }

    /// Clip most recently requested by the selector.
    #[must_use]
    pub const fn selected(&self) -> Option<AnimationClip> {
        self.selected
    }

    /// Consumes world events and the current movement state to emit crossfade requests.
    ///
    /// The first tick selects the clip for the current state; afterwards a
    /// request is only emitted when the movement state maps onto a different
    /// clip than the one already selected.
    pub fn handle(&mut self, events: &[Event], movement: MovementState, out: &mut Vec<Command>) {
        let observed = events.iter().any(|event| {
            matches!(
                event,
                Event::TimeAdvanced { .. } | Event::MovementStateChanged { .. }
            )
        });
        if !observed {
            return;
        }

        let target = AnimationClip::for_movement(movement);
        if self.selected == Some(target) {
            return;
        }

        self.selected = Some(target);
        out.push(Command::CrossfadeAnimation {
            to: target,
            blend: self.blend,
        });
    }
}

impl Default for AnimationSelector {
    fn default() -> Self {
        Self::with_blend(CROSSFADE_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monolake_core::InputSnapshot;

    fn tick() -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(16),
            input: InputSnapshot::RELEASED,
        }
    }

    #[test]
    fn first_tick_selects_idle() {
        let mut selector = AnimationSelector::default();
        let mut out = Vec::new();
        selector.handle(&[tick()], MovementState::Idle, &mut out);
        assert_eq!(
            out,
            vec![Command::CrossfadeAnimation {
                to: AnimationClip::Idle,
                blend: CROSSFADE_DURATION,
            }]
        );
    }

    #[test]
    fn unchanged_state_does_not_retrigger() {
        let mut selector = AnimationSelector::default();
        let mut out = Vec::new();
        for _ in 0..5 {
            selector.handle(&[tick()], MovementState::Moving, &mut out);
        }
        assert_eq!(out.len(), 1);
        assert_eq!(selector.selected(), Some(AnimationClip::Run));
    }

    #[test]
    fn waits_for_relevant_events() {
        let mut selector = AnimationSelector::default();
        let mut out = Vec::new();
        selector.handle(&[], MovementState::Moving, &mut out);
        assert!(out.is_empty());
        assert_eq!(selector.selected(), None);
    }
}
