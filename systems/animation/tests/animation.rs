use std::time::Duration;

use monolake_core::{AnimationClip, Command, Direction, Event, CROSSFADE_DURATION};
use monolake_system_animation::AnimationSelector;
use monolake_system_locomotion::Locomotion;
use monolake_world::{self as world, query, World};

#[derive(Default)]
struct Harness {
    world: World,
    locomotion: Locomotion,
    animation: AnimationSelector,
    crossfades: Vec<(Option<AnimationClip>, Option<AnimationClip>)>,
}

impl Harness {
    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        while !events.is_empty() {
            for event in &events {
                if let Event::AnimationCrossfaded {
                    fade_out, fade_in, ..
                } = event
                {
                    self.crossfades.push((*fade_out, *fade_in));
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
            self.animation
                .handle(&events, query::movement_state(&self.world), &mut commands);
            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn tick(&mut self) {
        self.submit(Command::Tick {
            dt: Duration::from_millis(16),
        });
    }

    fn hold(&mut self, direction: Direction, held: bool) {
        self.submit(Command::SetDirectionHeld { direction, held });
    }
}

#[test]
fn walking_and_stopping_crossfades_between_clips() {
    let mut harness = Harness::default();
    harness.submit(Command::InstallAnimationClips {
        clips: AnimationClip::ALL.to_vec(),
    });

    harness.tick();
    harness.hold(Direction::Forward, true);
    harness.tick();
    harness.tick();
    harness.hold(Direction::Forward, false);
    harness.tick();
    harness.tick();

    assert_eq!(
        harness.crossfades,
        vec![
            (None, Some(AnimationClip::Idle)),
            (Some(AnimationClip::Idle), Some(AnimationClip::Run)),
            (Some(AnimationClip::Run), Some(AnimationClip::Idle)),
        ]
    );
    assert_eq!(query::selected_clip(&harness.world), Some(AnimationClip::Idle));
}

#[test]
fn missing_run_clip_is_tolerated() {
    let mut harness = Harness::default();
    harness.submit(Command::InstallAnimationClips {
        clips: vec![AnimationClip::Idle],
    });

    harness.tick();
    harness.hold(Direction::Right, true);
    harness.tick();
    harness.hold(Direction::Right, false);
    harness.tick();

    assert_eq!(
        harness.crossfades,
        vec![
            (None, Some(AnimationClip::Idle)),
            (Some(AnimationClip::Idle), None),
            (None, Some(AnimationClip::Idle)),
        ]
    );
}

#[test]
fn clips_arriving_late_start_the_selected_animation() {
    let mut harness = Harness::default();
    harness.tick();
    assert!(harness.crossfades.is_empty());

    harness.submit(Command::InstallAnimationClips {
        clips: AnimationClip::ALL.to_vec(),
    });
    assert_eq!(harness.crossfades, vec![(None, Some(AnimationClip::Idle))]);

    let mut events = Vec::new();
    world::apply(
        &mut harness.world,
        Command::CrossfadeAnimation {
            to: AnimationClip::Idle,
            blend: CROSSFADE_DURATION,
        },
        &mut events,
    );
    assert!(events.is_empty(), "reselecting the active clip is a no-op");
}
