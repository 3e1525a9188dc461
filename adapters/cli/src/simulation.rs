//! Command/event pump wiring the world to its systems and collaborators.

use std::{mem, time::Duration};

use monolake_core::{AssetKind, Command, Direction, Event, PoiKey, WELCOME_BANNER};
use monolake_rendering::{
    AvatarPresentation, Color, FrameInput, InfoPanel, MarkerPresentation, Scene,
    TerrainPresentation, WaterAdjustment, WaterPresentation,
};
use monolake_system_animation::AnimationSelector;
use monolake_system_locomotion::Locomotion;
use monolake_system_proximity::Proximity;
use monolake_system_pulse::VisualPulse;
use monolake_world::{self as world, query, World};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    habitat::{HabitatCatalog, LakeIndicators, WaterGauge},
};

const WATER_EXTENT: f32 = 9.0;
const TERRAIN_COLOR: Color = Color::from_rgb_u8(150, 128, 98);
const WATER_COLOR: Color = Color::new(0.37, 0.62, 0.63, 0.8);
const AVATAR_COLOR: Color = Color::from_rgb_u8(214, 96, 64);
const MARKER_PALETTE: [Color; 6] = [
    Color::from_rgb_u8(70, 70, 80),
    Color::from_rgb_u8(196, 150, 90),
    Color::from_rgb_u8(40, 40, 40),
    Color::from_rgb_u8(110, 84, 60),
    Color::from_rgb_u8(235, 140, 120),
    Color::from_rgb_u8(180, 180, 170),
];

/// Payload handed to the presentation layer when a point is inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
    pub(crate) key: PoiKey,
    pub(crate) title: String,
    pub(crate) description: String,
}

/// Owns the world, the systems and the collaborators that react to its events.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    locomotion: Locomotion,
    proximity: Proximity,
    animation: AnimationSelector,
    pulse: VisualPulse,
    catalog: HabitatCatalog,
    gauge: WaterGauge,
    terrain_resolution: u32,
    terrain: Option<TerrainPresentation>,
    selection: Option<Selection>,
    notices: Vec<String>,
    queued_commands: Vec<Command>,
    events: Vec<Event>,
}

impl Simulation {
    pub(crate) fn new(config: &Config) -> Self {
        let catalog = HabitatCatalog::new(&config.habitats, config.lake.low_water_threshold);
        let gauge = WaterGauge::new(&config.lake);
        let mut simulation = Self {
            world: World::new(),
            locomotion: Locomotion::default(),
            proximity: Proximity::default(),
            animation: AnimationSelector::default(),
            pulse: VisualPulse::new(),
            catalog,
            gauge,
            terrain_resolution: config.assets.terrain_resolution,
            terrain: None,
            selection: None,
            notices: Vec::new(),
            queued_commands: Vec::new(),
            events: Vec::new(),
        };
        simulation.submit_registry();
        simulation
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub(crate) fn notices(&self) -> &[String] {
        &self.notices
    }

    pub(crate) fn water_level(&self) -> f32 {
        self.gauge.level()
    }

    /// Queues a command for the next [`Simulation::pump`].
    pub(crate) fn submit(&mut self, command: Command) {
        self.queued_commands.push(command);
    }

    pub(crate) fn set_direction(&mut self, direction: Direction, held: bool) {
        self.submit(Command::SetDirectionHeld { direction, held });
    }

    pub(crate) fn activate(&mut self) {
        self.submit(Command::Activate);
    }

    pub(crate) fn dismiss(&mut self) {
        self.selection = None;
    }

    /// Teleports the avatar onto the habitat with `key` if it is currently visible.
    pub(crate) fn focus_key(&mut self, key: &str) -> bool {
        let level = self.gauge.level();
        let target = self
            .catalog
            .active(level)
            .find(|habitat| habitat.key.as_str() == key)
            .map(|habitat| habitat.position);
        match target {
            Some(position) => {
                self.submit(Command::Teleport {
                    x: position.x(),
                    z: position.z(),
                });
                true
            }
            None => {
                warn!(key, "focus target is not visible at the current water level");
                false
            }
        }
    }

    /// Teleports the avatar onto the `index`-th visible habitat.
    pub(crate) fn focus_index(&mut self, index: usize) -> bool {
        let level = self.gauge.level();
        let key = self
            .catalog
            .active(level)
            .nth(index)
            .map(|habitat| habitat.key.as_str().to_owned());
        key.is_some_and(|key| self.focus_key(&key))
    }

    pub(crate) fn set_water_level(&mut self, level: f32) {
        if self.gauge.set(level) {
            self.on_water_level_changed();
        }
    }

    pub(crate) fn adjust_water(&mut self, adjustment: WaterAdjustment) {
        let delta = match adjustment {
            WaterAdjustment::Lower => -1,
            WaterAdjustment::Raise => 1,
        };
        if self.gauge.nudge(delta) {
            self.on_water_level_changed();
        }
    }

    fn on_water_level_changed(&mut self) {
        let level = self.gauge.level();
        info!(
            level,
            land_bridge = self.catalog.land_bridge_exposed(level),
            "water level changed"
        );
        self.submit_registry();
    }

    fn submit_registry(&mut self) {
        let points = self.catalog.points(self.gauge.level());
        self.submit(Command::ReplacePointsOfInterest { points });
    }

    /// Translates one frame of adapter input into commands and advances by `dt`.
    pub(crate) fn handle_frame(&mut self, dt: Duration, input: &FrameInput) -> &[Event] {
        if input.dismiss_panel {
            self.dismiss();
        }
        if let Some(adjustment) = input.water_adjustment {
            self.adjust_water(adjustment);
        }
        if let Some(index) = input.focus {
            let _ = self.focus_index(index);
        }

        let held = query::input_snapshot(&self.world);
        for direction in Direction::ALL {
            let wanted = input.held.is_held(direction);
            if held.is_held(direction) != wanted {
                self.set_direction(direction, wanted);
            }
        }
        if input.activate {
            self.activate();
        }

        self.advance(dt)
    }

    /// Queues a tick and pumps until no system has anything left to say.
    pub(crate) fn advance(&mut self, dt: Duration) -> &[Event] {
        self.submit(Command::Tick { dt });
        self.pump()
    }

    /// Applies queued commands and feeds the resulting events to every system
    /// until quiescent. Returns every event emitted along the way.
    pub(crate) fn pump(&mut self) -> &[Event] {
        self.events.clear();

        while !self.queued_commands.is_empty() {
            let mut batch = Vec::new();
            for command in mem::take(&mut self.queued_commands) {
                world::apply(&mut self.world, command, &mut batch);
            }
            if batch.is_empty() {
                continue;
            }

            self.observe(&batch);

            let pose = query::avatar_pose(&self.world);
            let mut follow_ups = Vec::new();
            self.locomotion.handle(
                &batch,
                pose,
                query::height_field(&self.world),
                &mut follow_ups,
            );
            self.proximity.handle(
                &batch,
                pose.position(),
                query::points_of_interest(&self.world),
                &mut follow_ups,
            );
            self.animation
                .handle(&batch, query::movement_state(&self.world), &mut follow_ups);
            self.pulse.handle(&batch);

            self.queued_commands.extend(follow_ups);
            self.events.extend(batch);
        }

        &self.events
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            debug!(?event, "world event");
            match event {
                Event::PointOfInterestActivated { key } => self.select(key),
                Event::HeightFieldReady { width, height } => {
                    info!(width, height, "terrain ready");
                    self.rebuild_terrain();
                }
                Event::AssetUnavailable { asset, reason } => {
                    let message = match asset {
                        AssetKind::HeightField => format!("Terrain unavailable: {reason}"),
                        AssetKind::AnimationClips => format!("Avatar animation: {reason}"),
                    };
                    warn!(%asset, %reason, "asset unavailable");
                    self.notices.push(message);
                }
                _ => {}
            }
        }
    }

    fn select(&mut self, key: &PoiKey) {
        match self.catalog.lookup(key.as_str()) {
            Some(habitat) => {
                info!(key = %key, title = %habitat.title, "habitat selected");
                self.selection = Some(Selection {
                    key: key.clone(),
                    title: habitat.title.clone(),
                    description: habitat.description.clone(),
                });
            }
            None => warn!(key = %key, "activated point has no catalog entry"),
        }
    }

    fn rebuild_terrain(&mut self) {
        let Some(field) = query::height_field(&self.world) else {
            return;
        };
        match TerrainPresentation::from_height_field(field, self.terrain_resolution, TERRAIN_COLOR)
        {
            Ok(terrain) => self.terrain = Some(terrain),
            Err(error) => warn!(%error, "terrain could not be presented"),
        }
    }

    /// Scene shown before the first frame.
    pub(crate) fn initial_scene(&self) -> Scene {
        let mut scene = Scene::new(
            WELCOME_BANNER,
            WaterPresentation::new(self.water_level(), WATER_EXTENT, WATER_COLOR),
            AvatarPresentation {
                pose: query::avatar_pose(&self.world),
                clip: None,
                color: AVATAR_COLOR,
            },
        );
        self.populate_scene(&mut scene);
        scene
    }

    /// Copies the current world snapshot into `scene`.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        scene.caption = query::welcome_banner(&self.world).to_owned();
        if scene.terrain.is_none() {
            scene.terrain = self.terrain.clone();
        }

        let level = self.water_level();
        scene.water.level = level;
        scene.status = LakeIndicators::at(level).lines(self.catalog.land_bridge_exposed(level));

        scene.avatar.pose = query::avatar_pose(&self.world);
        scene.avatar.clip = query::selected_clip(&self.world);

        let nearby = query::nearby_point(&self.world);
        scene.markers = self
            .catalog
            .active(level)
            .enumerate()
            .map(|(index, habitat)| {
                let color = MARKER_PALETTE[index % MARKER_PALETTE.len()];
                let mut marker = MarkerPresentation::new(
                    habitat.key.clone(),
                    habitat.title.as_str(),
                    habitat.position,
                    color,
                );
                marker.nearby = nearby == Some(&habitat.key);
                let pulse = self.pulse.sample(marker.nearby, 1.0);
                marker.bob_offset = pulse.bob_offset;
                marker.scale = pulse.scale;
                marker.ring_opacity = pulse.ring_opacity;
                marker
            })
            .collect();

        scene.panel = self
            .selection
            .as_ref()
            .map(|selection| InfoPanel::new(selection.title.as_str(), selection.description.as_str()));
        scene.notices = self.notices.clone();
    }
}
