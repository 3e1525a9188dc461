#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Visual pulse accumulator that animates point-of-interest markers.

use monolake_core::Event;

/// Phase advance per simulated second.
const PHASE_RATE: f32 = 2.0;
/// Vertical travel of the floating bob, in world units.
const BOB_AMPLITUDE: f32 = 0.1;
/// Relative size change of the breathing scale.
const SCALE_AMPLITUDE: f32 = 0.05;
/// Scale multiplier applied while a marker is hovered, focused, or nearby.
const ACTIVE_SCALE: f32 = 1.5;

/// Explicit phase accumulator advanced by simulated time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualPulse {
    phase: f32,
}

impl VisualPulse {
    /// Creates a pulse at phase zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Current phase in radians.
    #[must_use]
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Advances the phase for every tick contained in the event batch.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::TimeAdvanced { dt, .. } = event {
                self.phase += dt.as_secs_f32() * PHASE_RATE;
            }
        }
    }

    /// Evaluates the marker animation for the current phase.
    #[must_use]
    pub fn sample(&self, active: bool, base_scale: f32) -> PulseSample {
        let emphasis = if active { ACTIVE_SCALE } else { 1.0 };
        let breathing = 1.0 + (self.phase * 1.5).sin() * SCALE_AMPLITUDE;
        let ring_opacity = if active {
            0.8
        } else {
            0.4 + (self.phase * 3.0).sin() * 0.2
        };

        PulseSample {
            bob_offset: self.phase.sin() * BOB_AMPLITUDE,
            scale: base_scale * emphasis * breathing,
            ring_opacity,
        }
    }
}

/// Marker animation values for a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseSample {
    /// Vertical offset applied to the marker model.
    pub bob_offset: f32,
    /// Uniform scale applied to the marker model.
    pub scale: f32,
    /// Opacity of the ground ring beneath the marker.
    pub ring_opacity: f32,
}
