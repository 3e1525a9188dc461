#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Proximity system that reports the point of interest nearest to the avatar.

use monolake_core::{Command, Event, PoiKey, WorldPosition, PROXIMITY_RADIUS};
use monolake_world::PoiRegistry;

/// Pure system that re-evaluates proximity once the avatar has been placed.
#[derive(Debug)]
pub struct Proximity {
    radius: f32,
}

impl Proximity {
    /// Creates a proximity system with a custom trigger radius.
    #[must_use]
    pub const fn with_radius(radius: f32) -> Self {
        Self { radius }
    }

    /// Trigger radius used when selecting the nearby point.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Consumes world events and emits the nearest point inside the trigger radius.
    ///
    /// Only [`Event::AvatarMoved`] triggers an evaluation. Every tick ends with
    /// a placement, so registry swaps and teleports applied at the start of the
    /// tick are judged against the final pose of that tick. At most one [`Command::SetNearbyPoint`] is emitted per batch; the world
    /// suppresses results identical to the last reported key.
    pub fn handle(
        &self,
        events: &[Event],
        avatar: WorldPosition,
        registry: &PoiRegistry,
        out: &mut Vec<Command>,
    ) {
        let placed = events
            .iter()
            .any(|event| matches!(event, Event::AvatarMoved { .. }));
        if !placed {
            return;
        }

        let key = nearest_within(avatar, registry, self.radius).cloned();
        out.push(Command::SetNearbyPoint { key });
    }
}

impl Default for Proximity {
    fn default() -> Self {
        Self::with_radius(PROXIMITY_RADIUS)
    }
}

/// Selects the registry entry closest to `avatar` that lies strictly inside `radius`.
///
/// The running minimum starts at the radius, so entries at or beyond it are
/// never selected. When several entries share the minimum distance the first
/// one in registry order (ascending key) wins. An empty registry yields `None`.
#[must_use]
pub fn nearest_within<'registry>(
    avatar: WorldPosition,
    registry: &'registry PoiRegistry,
    radius: f32,
) -> Option<&'registry PoiKey> {
    let mut closest = None;
    let mut min_distance = radius;

    for (key, position) in registry.iter() {
        let distance = avatar.distance(position);
        if distance < min_distance {
            closest = Some(key);
            min_distance = distance;
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use monolake_core::{AvatarPose, PointOfInterest};

    fn registry(points: &[(&str, f32, f32, f32)]) -> PoiRegistry {
        let (registry, _) = PoiRegistry::from_points(
            points
                .iter()
                .map(|(key, x, y, z)| {
                    PointOfInterest::new(PoiKey::new(*key), WorldPosition::new(*x, *y, *z))
                })
                .collect(),
        );
        registry
    }

    #[test]
    fn empty_registry_yields_none() {
        let registry = PoiRegistry::default();
        assert_eq!(
            nearest_within(WorldPosition::default(), &registry, PROXIMITY_RADIUS),
            None
        );
    }

    #[test]
    fn ignores_events_unrelated_to_position() {
        let registry = registry(&[("fly", 0.0, 0.0, 1.0)]);
        let mut out = Vec::new();
        Proximity::default().handle(
            &[Event::NearbyPointChanged { key: None }],
            WorldPosition::default(),
            &registry,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn registry_swap_and_teleport_wait_for_placement() {
        let registry = registry(&[("far", -2.8, 0.5, 0.0)]);
        let mut out = Vec::new();
        Proximity::default().handle(
            &[
                Event::PointsOfInterestReplaced { count: 1 },
                Event::AvatarTeleported {
                    pose: AvatarPose::spawn(),
                },
            ],
            WorldPosition::new(0.0, 0.5, 0.0),
            &registry,
            &mut out,
        );
        assert!(out.is_empty());

        Proximity::default().handle(
            &[Event::AvatarMoved {
                pose: AvatarPose::spawn(),
            }],
            WorldPosition::new(0.0, 0.5, 0.0),
            &registry,
            &mut out,
        );
        assert_eq!(
            out,
            vec![Command::SetNearbyPoint {
                key: Some(PoiKey::new("far"))
            }]
        );
    }

    #[test]
    fn equal_distances_resolve_to_lowest_key() {
        let registry = registry(&[("nest", 1.0, 0.0, 0.0), ("coyote", -1.0, 0.0, 0.0)]);
        let nearest = nearest_within(WorldPosition::default(), &registry, PROXIMITY_RADIUS);
        assert_eq!(nearest.map(PoiKey::as_str), Some("coyote"));
    }
}
