#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Mono Lake explorer.

mod input;
mod registry;

use std::time::Duration;

use monolake_core::{
    AnimationClip, AssetKind, AvatarPose, Command, Event, HeightField, MovementState, PoiKey,
    WORLD_HALF_EXTENT, WELCOME_BANNER,
};
use tracing::{debug, warn};

pub use input::InputState;
pub use registry::PoiRegistry;

/// Represents the authoritative Mono Lake world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    input: InputState,
    pose: AvatarPose,
    movement: MovementState,
    height_field: Option<HeightField>,
    animation: AnimationSlots,
    registry: PoiRegistry,
    nearby: Option<PoiKey>,
    pending: PendingWrites,
    tick_index: u64,
}

impl World {
    /// Creates a new world with the avatar at its spawn pose and no assets loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            input: InputState::default(),
            pose: AvatarPose::spawn(),
            movement: MovementState::Idle,
            height_field: None,
            animation: AnimationSlots::default(),
            registry: PoiRegistry::default(),
            nearby: None,
            pending: PendingWrites::default(),
            tick_index: 0,
        }
    }

    fn apply_pending_writes(&mut self, out_events: &mut Vec<Event>) {
        if let Some((registry, duplicates)) = self.pending.registry.take() {
            if duplicates > 0 {
                warn!(
                    duplicates,
                    "point-of-interest registry contained duplicate keys"
                );
            }
            self.registry = registry;
            out_events.push(Event::PointsOfInterestReplaced {
                count: self.registry.len(),
            });
        }

        if let Some((x, z)) = self.pending.teleport.take() {
            let position = self.pose.position().with_planar(x, z);
            self.pose = AvatarPose::new(position, self.pose.heading());
            out_events.push(Event::AvatarTeleported { pose: self.pose });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// External writes latched between ticks; the most recent value wins.
#[derive(Debug, Default)]
struct PendingWrites {
    teleport: Option<(f32, f32)>,
    registry: Option<(PoiRegistry, usize)>,
}

/// Tracks which clips the avatar asset provides and which one is selected.
#[derive(Debug, Default)]
struct AnimationSlots {
    available: Option<Vec<AnimationClip>>,
    selected: Option<AnimationClip>,
    blend: Duration,
}

impl AnimationSlots {
    fn is_available(&self, clip: AnimationClip) -> bool {
        self.available
            .as_ref()
            .is_some_and(|clips| clips.contains(&clip))
    }

    fn playable(&self, clip: Option<AnimationClip>) -> Option<AnimationClip> {
        clip.filter(|clip| self.is_available(*clip))
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetDirectionHeld { direction, held } => {
            if world.input.set(direction, held) {
                debug!(?direction, held, "direction edge");
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.apply_pending_writes(out_events);
            out_events.push(Event::TimeAdvanced {
                dt,
                input: world.input.snapshot(),
            });
        }
        Command::Teleport { x, z } => {
            world.pending.teleport = Some((x, z));
        }
        Command::ReplacePointsOfInterest { points } => {
            world.pending.registry = Some(PoiRegistry::from_points(points));
        }
        Command::InstallHeightField { field } => {
            if world.height_field.is_some() {
                debug!("height field already installed; ignoring duplicate");
                return;
            }
            out_events.push(Event::HeightFieldReady {
                width: field.width(),
                height: field.height(),
            });
            world.height_field = Some(field);
        }
        Command::InstallAnimationClips { clips } => {
            if world.animation.available.is_some() {
                debug!("animation clips already installed; ignoring duplicate");
                return;
            }
            world.animation.available = Some(clips.clone());
            out_events.push(Event::AnimationClipsReady { clips });

            let selected = world.animation.playable(world.animation.selected);
            if selected.is_some() {
                out_events.push(Event::AnimationCrossfaded {
                    fade_out: None,
                    fade_in: selected,
                    blend: world.animation.blend,
                });
            }
        }
        Command::ReportAssetUnavailable { asset, reason } => {
            warn!(%asset, %reason, "asset unavailable; keeping fallbacks");
            out_events.push(Event::AssetUnavailable { asset, reason });
        }
        Command::PlaceAvatar { pose, movement } => {
            let position = pose.position();
            let clamped = position.with_planar(
                position.x().clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT),
                position.z().clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT),
            );
            world.pose = AvatarPose::new(clamped, pose.heading());
            out_events.push(Event::AvatarMoved { pose: world.pose });

            if world.movement != movement {
                out_events.push(Event::MovementStateChanged {
                    from: world.movement,
                    to: movement,
                });
                world.movement = movement;
            }
        }
        Command::CrossfadeAnimation { to, blend } => {
            let previous = world.animation.selected.replace(to);
            world.animation.blend = blend;
            if previous == Some(to) {
                return;
            }

            let fade_out = world.animation.playable(previous);
            let fade_in = world.animation.playable(Some(to));
            if fade_out.is_some() || fade_in.is_some() {
                out_events.push(Event::AnimationCrossfaded {
                    fade_out,
                    fade_in,
                    blend,
                });
            }
        }
        Command::SetNearbyPoint { key } => {
            if world.nearby != key {
                world.nearby = key.clone();
                out_events.push(Event::NearbyPointChanged { key });
            }
        }
        Command::Activate => {
            if let Some(key) = world.nearby.clone() {
                out_events.push(Event::PointOfInterestActivated { key });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use monolake_core::{
        AnimationClip, AvatarPose, HeightField, InputSnapshot, MovementState, PoiKey,
    };

    use super::{PoiRegistry, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current pose of the avatar.
    #[must_use]
    pub fn avatar_pose(world: &World) -> AvatarPose {
        world.pose
    }

    /// Movement state recorded by the most recent locomotion step.
    #[must_use]
    pub fn movement_state(world: &World) -> MovementState {
        world.movement
    }

    /// Directions currently held, including edges received since the last tick.
    #[must_use]
    pub fn input_snapshot(world: &World) -> InputSnapshot {
        world.input.snapshot()
    }

    /// Terrain height field, once the asset finished loading.
    #[must_use]
    pub fn height_field(world: &World) -> Option<&HeightField> {
        world.height_field.as_ref()
    }

    /// Active point-of-interest registry.
    #[must_use]
    pub fn points_of_interest(world: &World) -> &PoiRegistry {
        &world.registry
    }

    /// Key last reported as nearby, if any.
    #[must_use]
    pub fn nearby_point(world: &World) -> Option<&PoiKey> {
        world.nearby.as_ref()
    }

    /// Clip currently selected for the avatar, whether or not it is playable yet.
    #[must_use]
    pub fn selected_clip(world: &World) -> Option<AnimationClip> {
        world.animation.selected
    }

    /// Clips provided by the avatar asset, once loaded.
    #[must_use]
    pub fn available_clips(world: &World) -> Option<&[AnimationClip]> {
        world.animation.available.as_deref()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monolake_core::{Direction, PointOfInterest, WorldPosition};

    fn tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn tick_snapshots_held_input() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetDirectionHeld {
                direction: Direction::Right,
                held: true,
            },
            &mut events,
        );
        assert!(events.is_empty());

        let events = tick(&mut world);
        let Some(Event::TimeAdvanced { input, .. }) = events.last() else {
            panic!("expected time advanced event, got {events:?}");
        };
        assert!(input.right);
        assert!(!input.left);
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn teleport_is_latched_until_next_tick() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Teleport { x: 1.0, z: 1.0 }, &mut events);
        apply(&mut world, Command::Teleport { x: 2.0, z: -3.0 }, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::avatar_pose(&world), AvatarPose::spawn());

        let events = tick(&mut world);
        let pose = query::avatar_pose(&world);
        assert_eq!(pose.position(), WorldPosition::new(2.0, 0.5, -3.0));
        assert_eq!(pose.heading(), 0.0);
        assert_eq!(events[0], Event::AvatarTeleported { pose });
        assert!(matches!(events[1], Event::TimeAdvanced { .. }));
    }

    #[test]
    fn registry_swap_applies_on_tick() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ReplacePointsOfInterest {
                points: vec![PointOfInterest::new(
                    PoiKey::new("nest"),
                    WorldPosition::new(-0.5, 1.0, -1.1),
                )],
            },
            &mut events,
        );
        assert!(query::points_of_interest(&world).is_empty());

        let events = tick(&mut world);
        assert_eq!(events[0], Event::PointsOfInterestReplaced { count: 1 });
        assert!(query::points_of_interest(&world).contains("nest"));
    }

    #[test]
    fn place_avatar_clamps_to_world_bounds() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceAvatar {
                pose: AvatarPose::new(WorldPosition::new(7.0, 0.2, -9.0), 1.0),
                movement: MovementState::Moving,
            },
            &mut events,
        );
        let position = query::avatar_pose(&world).position();
        assert_eq!(position, WorldPosition::new(5.0, 0.2, -5.0));
        assert_eq!(
            events[1],
            Event::MovementStateChanged {
                from: MovementState::Idle,
                to: MovementState::Moving,
            }
        );
    }

    #[test]
    fn nearby_point_changes_are_reported_once() {
        let mut world = World::new();
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(
                &mut world,
                Command::SetNearbyPoint {
                    key: Some(PoiKey::new("fly")),
                },
                &mut events,
            );
        }
        apply(&mut world, Command::SetNearbyPoint { key: None }, &mut events);
        apply(&mut world, Command::SetNearbyPoint { key: None }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::NearbyPointChanged {
                    key: Some(PoiKey::new("fly"))
                },
                Event::NearbyPointChanged { key: None },
            ]
        );
    }

    #[test]
    fn activate_requires_nearby_point() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Activate, &mut events);
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::SetNearbyPoint {
                key: Some(PoiKey::new("osprey")),
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::Activate, &mut events);
        assert_eq!(
            events,
            vec![Event::PointOfInterestActivated {
                key: PoiKey::new("osprey")
            }]
        );
    }

    #[test]
    fn height_field_installs_once() {
        let mut world = World::new();
        let field = HeightField::from_intensities(2, 2, vec![0, 64, 128, 255], 0.5)
            .expect("valid field");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallHeightField {
                field: field.clone(),
            },
            &mut events,
        );
        apply(&mut world, Command::InstallHeightField { field }, &mut events);
        assert_eq!(
            events,
            vec![Event::HeightFieldReady {
                width: 2,
                height: 2
            }]
        );
        assert!(query::height_field(&world).is_some());
    }

    #[test]
    fn crossfade_skips_missing_clips() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallAnimationClips {
                clips: vec![AnimationClip::Run],
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::CrossfadeAnimation {
                to: AnimationClip::Idle,
                blend: Duration::from_millis(200),
            },
            &mut events,
        );
        assert!(events.is_empty(), "idle clip is missing: {events:?}");

        apply(
            &mut world,
            Command::CrossfadeAnimation {
                to: AnimationClip::Run,
                blend: Duration::from_millis(200),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::AnimationCrossfaded {
                fade_out: None,
                fade_in: Some(AnimationClip::Run),
                blend: Duration::from_millis(200),
            }]
        );
    }

    #[test]
    fn late_clips_fade_in_selected_animation() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::CrossfadeAnimation {
                to: AnimationClip::Idle,
                blend: Duration::from_millis(200),
            },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::InstallAnimationClips {
                clips: AnimationClip::ALL.to_vec(),
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::AnimationCrossfaded {
                fade_out: None,
                fade_in: Some(AnimationClip::Idle),
                blend: Duration::from_millis(200),
            })
        );
    }
}
