#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain-aware locomotion system that integrates held directions into avatar poses.

use std::time::Duration;

use glam::Vec2;
use monolake_core::{
    AvatarPose, Command, Event, HeightField, InputSnapshot, MovementState, AVATAR_SPEED,
    WORLD_HALF_EXTENT,
};

/// Tunables for the locomotion step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocomotionConfig {
    speed: f32,
    half_extent: f32,
}

impl LocomotionConfig {
    /// Creates a configuration with an explicit speed and square world bound.
    #[must_use]
    pub const fn new(speed: f32, half_extent: f32) -> Self {
        Self { speed, half_extent }
    }

    /// Distance travelled per second while a direction is held.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Half of the side length of the square area the avatar may occupy.
    #[must_use]
    pub const fn half_extent(&self) -> f32 {
        self.half_extent
    }
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self::new(AVATAR_SPEED, WORLD_HALF_EXTENT)
    }
}

/// Pure system that reacts to ticks and proposes the next avatar pose.
#[derive(Debug, Default)]
pub struct Locomotion {
    config: LocomotionConfig,
}

impl Locomotion {
    /// Creates a locomotion system using the provided configuration.
    #[must_use]
    pub const fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    /// Consumes world events and the current pose to emit placement commands.
    ///
    /// One [`Command::PlaceAvatar`] is produced for every
    /// [`Event::TimeAdvanced`] in the batch, each step continuing from the
    /// pose produced by the previous one.
    pub fn handle(
        &self,
        events: &[Event],
        pose: AvatarPose,
        height_field: Option<&HeightField>,
        out: &mut Vec<Command>,
    ) {
        let mut pose = pose;
        for event in events {
            if let Event::TimeAdvanced { dt, input } = event {
                let next = step(pose, *input, *dt, height_field, &self.config);
                pose = next.pose;
                out.push(Command::PlaceAvatar {
                    pose: next.pose,
                    movement: next.movement,
                });
            }
        }
    }
}

/// Outcome of a single locomotion step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Pose after integrating movement, clamping, and terrain sampling.
    pub pose: AvatarPose,
    /// Movement state derived from the input snapshot.
    pub movement: MovementState,
}

/// Raw direction accumulated from the held flags, with `y` holding the z component.
///
/// Each held flag contributes one unit on its axis, so opposing flags cancel.
#[must_use]
pub fn direction_vector(input: InputSnapshot) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if input.forward {
        direction.y -= 1.0;
    }
    if input.backward {
        direction.y += 1.0;
    }
    if input.left {
        direction.x -= 1.0;
    }
    if input.right {
        direction.x += 1.0;
    }
    direction
}

/// Advances the avatar by one tick.
///
/// Movement is applied before clamping so motion against a wall keeps sliding
/// along the free axis. Elevation is resampled at the clamped location; while
/// no height field is available the previous elevation is retained.
#[must_use]
pub fn step(
    pose: AvatarPose,
    input: InputSnapshot,
    dt: Duration,
    height_field: Option<&HeightField>,
    config: &LocomotionConfig,
) -> Step {
    let movement = MovementState::from_input(input);
    let mut position = pose.position();
    let mut heading = pose.heading();

    let direction = direction_vector(input);
    if direction != Vec2::ZERO {
        let unit = direction.normalize();
        let distance = config.speed * dt.as_secs_f32();
        position = position.with_planar(
            position.x() + unit.x * distance,
            position.z() + unit.y * distance,
        );
        heading = unit.x.atan2(unit.y);
    }

    let bound = config.half_extent;
    let x = position.x().clamp(-bound, bound);
    let z = position.z().clamp(-bound, bound);
    position = position.with_planar(x, z);

    let extent = bound * 2.0;
    let elevation = height_field
        .and_then(|field| field.sample((x + bound) / extent, (z + bound) / extent))
        .unwrap_or(position.y());

    Step {
        pose: AvatarPose::new(position.with_elevation(elevation), heading),
        movement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monolake_core::{Direction, WorldPosition};

    const TICK: Duration = Duration::from_millis(100);

    fn held(directions: &[Direction]) -> InputSnapshot {
        directions
            .iter()
            .fold(InputSnapshot::RELEASED, |input, direction| {
                input.with(*direction, true)
            })
    }

    #[test]
    fn forward_moves_toward_negative_z() {
        let next = step(
            AvatarPose::spawn(),
            held(&[Direction::Forward]),
            TICK,
            None,
            &LocomotionConfig::default(),
        );
        let position = next.pose.position();
        assert!((position.z() + 0.5).abs() < 1e-6);
        assert!(position.x().abs() < 1e-6);
        assert_eq!(next.movement, MovementState::Moving);
    }

    #[test]
    fn heading_faces_travel_direction() {
        let cases = [
            (Direction::Backward, 0.0),
            (Direction::Right, std::f32::consts::FRAC_PI_2),
            (Direction::Left, -std::f32::consts::FRAC_PI_2),
            (Direction::Forward, std::f32::consts::PI),
        ];
        for (direction, expected) in cases {
            let next = step(
                AvatarPose::spawn(),
                held(&[direction]),
                TICK,
                None,
                &LocomotionConfig::default(),
            );
            assert!(
                (next.pose.heading() - expected).abs() < 1e-6,
                "{direction:?} produced heading {}",
                next.pose.heading()
            );
        }
    }

    #[test]
    fn idle_preserves_heading_and_position() {
        let pose = AvatarPose::new(WorldPosition::new(1.0, 0.3, -2.0), 1.25);
        let next = step(
            pose,
            InputSnapshot::RELEASED,
            TICK,
            None,
            &LocomotionConfig::default(),
        );
        assert_eq!(next.pose, pose);
        assert_eq!(next.movement, MovementState::Idle);
    }

    #[test]
    fn opposing_flags_cancel_but_still_count_as_moving() {
        let pose = AvatarPose::new(WorldPosition::new(0.0, 0.5, 0.0), 0.7);
        let next = step(
            pose,
            held(&[Direction::Left, Direction::Right]),
            TICK,
            None,
            &LocomotionConfig::default(),
        );
        assert_eq!(next.pose, pose);
        assert_eq!(next.movement, MovementState::Moving);
    }

    #[test]
    fn direction_vector_accumulates_independently() {
        assert_eq!(
            direction_vector(held(&[Direction::Forward, Direction::Right])),
            Vec2::new(1.0, -1.0)
        );
        assert_eq!(
            direction_vector(held(&Direction::ALL)),
            Vec2::ZERO,
            "all four flags cancel"
        );
    }

    #[test]
    fn elevation_follows_height_field() {
        let field = HeightField::from_intensities(2, 2, vec![0, 0, 255, 255], 0.5)
            .expect("valid field");
        let pose = AvatarPose::new(WorldPosition::new(0.0, 0.5, 5.0), 0.0);
        let next = step(
            pose,
            InputSnapshot::RELEASED,
            TICK,
            Some(&field),
            &LocomotionConfig::default(),
        );
        assert!((next.pose.position().y() - 0.5).abs() < 1e-6);

        let pose = AvatarPose::new(WorldPosition::new(0.0, 0.5, -5.0), 0.0);
        let next = step(
            pose,
            InputSnapshot::RELEASED,
            TICK,
            Some(&field),
            &LocomotionConfig::default(),
        );
        assert!(next.pose.position().y().abs() < 1e-6);
    }
}
