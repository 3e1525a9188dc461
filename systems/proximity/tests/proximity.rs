use std::time::Duration;

use monolake_core::{
    Command, Direction, Event, PoiKey, PointOfInterest, WorldPosition, PROXIMITY_RADIUS,
};
use monolake_system_locomotion::Locomotion;
use monolake_system_proximity::{nearest_within, Proximity};
use monolake_world::{self as world, query, PoiRegistry, World};

fn registry(points: &[(&str, WorldPosition)]) -> PoiRegistry {
    let (registry, _) = PoiRegistry::from_points(
        points
            .iter()
            .map(|(key, position)| PointOfInterest::new(PoiKey::new(*key), *position))
            .collect(),
    );
    registry
}

struct Harness {
    world: World,
    locomotion: Locomotion,
    proximity: Proximity,
    notifications: Vec<Option<PoiKey>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            world: World::new(),
            locomotion: Locomotion::default(),
            proximity: Proximity::default(),
            notifications: Vec::new(),
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        while !events.is_empty() {
            for event in &events {
                if let Event::NearbyPointChanged { key } = event {
                    self.notifications.push(key.clone());
                }
            }

            let mut commands = Vec::new();
            self.locomotion.handle(
                &events,
                query::avatar_pose(&self.world),
                query::height_field(&self.world),
                &mut commands,
            );
            let mut follow_up = Vec::new();
            for command in commands {
                world::apply(&mut self.world, command, &mut follow_up);
            }
            events.extend(follow_up);

            let mut commands = Vec::new();
            self.proximity.handle(
                &events,
                query::avatar_pose(&self.world).position(),
                query::points_of_interest(&self.world),
                &mut commands,
            );
            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn tick(&mut self) {
        self.submit(Command::Tick {
            dt: Duration::from_millis(100),
        });
    }
}

#[test]
fn radius_is_exclusive() {
    let avatar = WorldPosition::new(0.0, 0.0, 0.0);

    let at_radius = registry(&[("grebe", WorldPosition::new(0.0, 0.0, PROXIMITY_RADIUS))]);
    assert_eq!(nearest_within(avatar, &at_radius, PROXIMITY_RADIUS), None);

    let beyond = registry(&[("grebe", WorldPosition::new(0.0, 0.0, 3.5))]);
    assert_eq!(nearest_within(avatar, &beyond, PROXIMITY_RADIUS), None);

    let inside = registry(&[("grebe", WorldPosition::new(0.0, 0.0, 2.999))]);
    assert_eq!(
        nearest_within(avatar, &inside, PROXIMITY_RADIUS).map(PoiKey::as_str),
        Some("grebe")
    );
}

#[test]
fn closer_entry_wins_regardless_of_key_order() {
    let avatar = WorldPosition::new(0.0, 0.5, 0.0);
    let registry = registry(&[
        ("alpha", WorldPosition::new(2.5, 0.5, 0.0)),
        ("zulu", WorldPosition::new(0.0, 0.5, 2.0)),
    ]);
    assert_eq!(
        nearest_within(avatar, &registry, PROXIMITY_RADIUS).map(PoiKey::as_str),
        Some("zulu")
    );
}

#[test]
fn walking_past_a_point_reports_enter_and_leave_once() {
    let mut harness = Harness::new();
    harness.submit(Command::ReplacePointsOfInterest {
        points: vec![PointOfInterest::new(
            PoiKey::new("osprey"),
            WorldPosition::new(0.0, 1.0, 4.0),
        )],
    });

    harness.submit(Command::SetDirectionHeld {
        direction: Direction::Backward,
        held: true,
    });
    for _ in 0..10 {
        harness.tick();
    }
    harness.submit(Command::SetDirectionHeld {
        direction: Direction::Backward,
        held: false,
    });
    for _ in 0..5 {
        harness.tick();
    }
    assert_eq!(
        harness.notifications,
        vec![Some(PoiKey::new("osprey"))],
        "approaching and idling must notify exactly once"
    );

    harness.submit(Command::SetDirectionHeld {
        direction: Direction::Forward,
        held: true,
    });
    for _ in 0..20 {
        harness.tick();
    }
    assert_eq!(
        harness.notifications,
        vec![Some(PoiKey::new("osprey")), None]
    );
}

#[test]
fn registry_swap_re_evaluates_without_movement() {
    let mut harness = Harness::new();
    harness.submit(Command::ReplacePointsOfInterest {
        points: vec![PointOfInterest::new(
            PoiKey::new("nest"),
            WorldPosition::new(-0.5, 1.0, -1.1),
        )],
    });
    harness.tick();
    assert_eq!(query::nearby_point(&harness.world).map(PoiKey::as_str), Some("nest"));

    harness.submit(Command::ReplacePointsOfInterest {
        points: vec![PointOfInterest::new(
            PoiKey::new("coyote"),
            WorldPosition::new(-0.5, 1.0, -1.1),
        )],
    });
    harness.tick();

    assert_eq!(
        harness.notifications,
        vec![Some(PoiKey::new("nest")), Some(PoiKey::new("coyote"))]
    );
}

#[test]
fn teleport_next_to_point_marks_it_nearby() {
    let mut harness = Harness::new();
    harness.submit(Command::ReplacePointsOfInterest {
        points: vec![
            PointOfInterest::new(PoiKey::new("fly"), WorldPosition::new(2.6, 0.5, -2.6)),
            PointOfInterest::new(PoiKey::new("shrimp"), WorldPosition::new(-2.0, 0.5, 0.4)),
        ],
    });
    harness.tick();
    assert_eq!(harness.notifications, vec![Some(PoiKey::new("shrimp"))]);

    harness.submit(Command::Teleport { x: 2.6, z: -2.6 });
    harness.tick();
    assert_eq!(
        query::nearby_point(&harness.world).map(PoiKey::as_str),
        Some("fly")
    );
}
