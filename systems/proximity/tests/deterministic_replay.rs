use std::time::Duration;

use monolake_core::{
    AvatarPose, Command, Direction, Event, HeightField, PoiKey, PointOfInterest, WorldPosition,
};
use monolake_system_locomotion::Locomotion;
use monolake_system_proximity::Proximity;
use monolake_world::{self as world, query, World};

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(
        first.nearby_changes,
        vec![
            Some(PoiKey::new("tufa")),
            None,
            Some(PoiKey::new("island")),
        ]
    );
}

#[test]
fn replay_ends_on_the_island_at_terrain_height() {
    let outcome = replay(scripted_commands());

    let position = outcome.final_pose.position();
    assert!((position.x() - -3.0).abs() < 1e-5);
    assert!((position.z() - 3.0).abs() < 1e-5);
    assert!((position.y() - 0.25).abs() < 1e-5);
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    final_pose: AvatarPose,
    nearby_changes: Vec<Option<PoiKey>>,
    events: Vec<Event>,
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new();
    let locomotion = Locomotion::default();
    let proximity = Proximity::default();
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);

        while !events.is_empty() {
            log.extend(events.iter().cloned());

            let mut commands = Vec::new();
            locomotion.handle(
                &events,
                query::avatar_pose(&world),
                query::height_field(&world),
                &mut commands,
            );
            proximity.handle(
                &events,
                query::avatar_pose(&world).position(),
                query::points_of_interest(&world),
                &mut commands,
            );

            events.clear();
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
        }
    }

    let nearby_changes = log
        .iter()
        .filter_map(|event| match event {
            Event::NearbyPointChanged { key } => Some(key.clone()),
            _ => None,
        })
        .collect();

    ReplayOutcome {
        final_pose: query::avatar_pose(&world),
        nearby_changes,
        events: log,
    }
}

fn scripted_commands() -> Vec<Command> {
    let tick = || Command::Tick {
        dt: Duration::from_millis(100),
    };
    let field = HeightField::from_intensities(2, 2, vec![255; 4], 0.25).expect("valid field");

    let mut commands = vec![
        Command::ReplacePointsOfInterest {
            points: vec![
                PointOfInterest::new(PoiKey::new("tufa"), WorldPosition::new(2.0, 0.5, 0.0)),
                PointOfInterest::new(PoiKey::new("island"), WorldPosition::new(-3.0, 0.5, 3.0)),
            ],
        },
        Command::InstallHeightField { field },
        tick(),
        Command::SetDirectionHeld {
            direction: Direction::Left,
            held: true,
        },
    ];
    commands.extend((0..12).map(|_| tick()));
    commands.push(Command::SetDirectionHeld {
        direction: Direction::Left,
        held: false,
    });
    commands.push(Command::Teleport { x: -3.0, z: 3.0 });
    commands.push(tick());
    commands
}
