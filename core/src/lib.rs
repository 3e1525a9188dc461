#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mono Lake explorer.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations (held keys, ticks, teleports, registry swaps,
//! loaded assets), the world executes those commands via its `apply` entry
//! point, and then broadcasts [`Event`] values for systems to react to
//! deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod height_field;

use std::{borrow::Borrow, fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use height_field::{normalised_coordinates, HeightField, HeightFieldError};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Mono Lake.";

/// Half of the side length of the square terrain footprint in world units.
pub const WORLD_HALF_EXTENT: f32 = 5.0;

/// Side length of the square terrain footprint in world units.
pub const WORLD_EXTENT: f32 = WORLD_HALF_EXTENT * 2.0;

/// Speed of the avatar while a direction is held, in world units per second.
pub const AVATAR_SPEED: f32 = 5.0;

/// Maximum distance at which a point of interest counts as nearby.
pub const PROXIMITY_RADIUS: f32 = 3.0;

/// Factor converting normalised terrain intensity into world-space elevation.
pub const DEFAULT_DISPLACEMENT_SCALE: f32 = 0.5;

/// Blend duration applied when switching between animation clips.
pub const CROSSFADE_DURATION: Duration = Duration::from_millis(200);

/// Location where the avatar appears when the experience starts.
pub const SPAWN_POSITION: WorldPosition = WorldPosition::new(0.0, 0.5, 0.0);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Records a key-down or key-up edge for one logical direction.
    SetDirectionHeld {
        /// Direction whose held state changed.
        direction: Direction,
        /// Whether the direction is now held.
        held: bool,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the avatar snap to the provided planar location on the next tick.
    Teleport {
        /// Target coordinate along the x axis.
        x: f32,
        /// Target coordinate along the z axis.
        z: f32,
    },
    /// Replaces the active point-of-interest registry on the next tick.
    ReplacePointsOfInterest {
        /// Complete set of points that should become active.
        points: Vec<PointOfInterest>,
    },
    /// Hands a decoded height field to the world once the terrain asset is ready.
    InstallHeightField {
        /// Decoded, immutable height field.
        field: HeightField,
    },
    /// Hands the set of animation clips resolved from the avatar asset to the world.
    InstallAnimationClips {
        /// Clips that the avatar asset provides.
        clips: Vec<AnimationClip>,
    },
    /// Reports that an asset could not be produced.
    ReportAssetUnavailable {
        /// Asset that failed to load.
        asset: AssetKind,
        /// Human readable description of the failure.
        reason: String,
    },
    /// Proposes the avatar pose produced by a locomotion step.
    PlaceAvatar {
        /// Pose the avatar should adopt.
        pose: AvatarPose,
        /// Movement state derived from the input snapshot of the step.
        movement: MovementState,
    },
    /// Requests a crossfade towards the provided animation clip.
    CrossfadeAnimation {
        /// Clip that should become the active animation.
        to: AnimationClip,
        /// Duration of the blend between the previous and the new clip.
        blend: Duration,
    },
    /// Reports the point of interest currently closest to the avatar.
    SetNearbyPoint {
        /// Key of the nearest point inside the trigger radius, if any.
        key: Option<PoiKey>,
    },
    /// Confirms interaction with the nearby point of interest.
    Activate,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Directional input held at the start of the tick.
        input: InputSnapshot,
    },
    /// Confirms that a latched teleport was applied to the avatar.
    AvatarTeleported {
        /// Pose of the avatar immediately after the teleport.
        pose: AvatarPose,
    },
    /// Confirms that a latched registry replacement became active.
    PointsOfInterestReplaced {
        /// Number of distinct points in the new registry.
        count: usize,
    },
    /// Announces that the terrain height field became available.
    HeightFieldReady {
        /// Width of the height field in samples.
        width: u32,
        /// Height of the height field in samples.
        height: u32,
    },
    /// Announces that the avatar animation clips became available.
    AnimationClipsReady {
        /// Clips provided by the avatar asset.
        clips: Vec<AnimationClip>,
    },
    /// Reports that an asset could not be produced and fallbacks stay in effect.
    AssetUnavailable {
        /// Asset that failed to load.
        asset: AssetKind,
        /// Human readable description of the failure.
        reason: String,
    },
    /// Confirms the avatar pose after a locomotion step.
    AvatarMoved {
        /// Pose the avatar adopted.
        pose: AvatarPose,
    },
    /// Announces that the avatar switched between idling and moving.
    MovementStateChanged {
        /// State before the change.
        from: MovementState,
        /// State after the change.
        to: MovementState,
    },
    /// Instructs presentation to blend between animation clips.
    AnimationCrossfaded {
        /// Available clip that should fade out, if any.
        fade_out: Option<AnimationClip>,
        /// Available clip that should fade in, if any.
        fade_in: Option<AnimationClip>,
        /// Duration of the blend.
        blend: Duration,
    },
    /// Announces that the nearest point of interest changed.
    NearbyPointChanged {
        /// Key of the new nearby point, or `None` when nothing is in range.
        key: Option<PoiKey>,
    },
    /// Announces that the user confirmed interaction with the nearby point.
    PointOfInterestActivated {
        /// Key of the activated point.
        key: PoiKey,
    },
}

/// Position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    x: f32,
    y: f32,
    z: f32,
}

impl WorldPosition {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along the x axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Elevation above the base plane.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Coordinate along the z axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Returns a copy with the planar coordinates replaced.
    #[must_use]
    pub const fn with_planar(self, x: f32, z: f32) -> Self {
        Self { x, y: self.y, z }
    }

    /// Returns a copy with the elevation replaced.
    #[must_use]
    pub const fn with_elevation(self, y: f32) -> Self {
        Self {
            x: self.x,
            y,
            z: self.z,
        }
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: WorldPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Position and facing of the avatar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarPose {
    position: WorldPosition,
    heading: f32,
}

impl AvatarPose {
    /// Creates a pose from a position and a yaw angle in radians.
    #[must_use]
    pub const fn new(position: WorldPosition, heading: f32) -> Self {
        Self { position, heading }
    }

    /// Pose adopted when the experience starts.
    #[must_use]
    pub const fn spawn() -> Self {
        Self::new(SPAWN_POSITION, 0.0)
    }

    /// Current position of the avatar.
    #[must_use]
    pub const fn position(&self) -> WorldPosition {
        self.position
    }

    /// Yaw angle in radians, measured so that `atan2(dx, dz)` faces the travel direction.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.heading
    }
}

impl Default for AvatarPose {
    fn default() -> Self {
        Self::spawn()
    }
}

/// Logical directions delivered by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Movement toward negative z.
    Forward,
    /// Movement toward positive z.
    Backward,
    /// Movement toward negative x.
    Left,
    /// Movement toward positive x.
    Right,
}

impl Direction {
    /// Every direction in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Copy of the held directional flags taken once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputSnapshot {
    /// Whether forward is held.
    pub forward: bool,
    /// Whether backward is held.
    pub backward: bool,
    /// Whether left is held.
    pub left: bool,
    /// Whether right is held.
    pub right: bool,
}

impl InputSnapshot {
    /// Snapshot with no directions held.
    pub const RELEASED: Self = Self {
        forward: false,
        backward: false,
        left: false,
        right: false,
    };

    /// Reports whether the provided direction is held.
    #[must_use]
    pub const fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Reports whether any direction is held.
    #[must_use]
    pub const fn any_held(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Returns a copy with the provided direction set to `held`.
    #[must_use]
    pub fn with(mut self, direction: Direction, held: bool) -> Self {
        match direction {
            Direction::Forward => self.forward = held,
            Direction::Backward => self.backward = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
        self
    }
}

/// Discrete locomotion state of the avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementState {
    /// No direction is held.
    #[default]
    Idle,
    /// At least one direction is held.
    Moving,
}

impl MovementState {
    /// Derives the movement state from the flags held at the start of a tick.
    #[must_use]
    pub const fn from_input(input: InputSnapshot) -> Self {
        if input.any_held() {
            Self::Moving
        } else {
            Self::Idle
        }
    }
}

/// Animation clips the avatar asset is expected to provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimationClip {
    /// Clip played while standing still.
    Idle,
    /// Clip played while moving.
    Run,
}

impl AnimationClip {
    /// Every clip in declaration order.
    pub const ALL: [AnimationClip; 2] = [AnimationClip::Idle, AnimationClip::Run];

    /// Clip that represents the provided movement state.
    #[must_use]
    pub const fn for_movement(state: MovementState) -> Self {
        match state {
            MovementState::Idle => Self::Idle,
            MovementState::Moving => Self::Run,
        }
    }

    /// Resolves a clip name exported by the avatar asset.
    ///
    /// Rigged exports prefix clips with their armature name, so both
    /// `CharacterArmature|Run` and a bare `Run` map to [`AnimationClip::Run`].
    #[must_use]
    pub fn from_asset_name(name: &str) -> Option<Self> {
        let clip = name.rsplit('|').next().unwrap_or(name).trim();
        match clip {
            "Idle" => Some(Self::Idle),
            "Run" => Some(Self::Run),
            _ => None,
        }
    }
}

/// Stable identifier of a point of interest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiKey(String);

impl PoiKey {
    /// Creates a new key from the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PoiKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Interactive location the avatar can approach.
#[derive(Clone, Debug, PartialEq)]
pub struct PointOfInterest {
    key: PoiKey,
    position: WorldPosition,
}

impl PointOfInterest {
    /// Creates a new point of interest.
    #[must_use]
    pub fn new(key: PoiKey, position: WorldPosition) -> Self {
        Self { key, position }
    }

    /// Identifier of the point.
    #[must_use]
    pub fn key(&self) -> &PoiKey {
        &self.key
    }

    /// Location of the point in world units.
    #[must_use]
    pub const fn position(&self) -> WorldPosition {
        self.position
    }
}

/// Assets the simulation waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Grayscale terrain height image.
    HeightField,
    /// Animation clips bundled with the avatar model.
    AnimationClips,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeightField => write!(f, "height field"),
            Self::AnimationClips => write!(f, "animation clips"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AnimationClip, Direction, InputSnapshot, MovementState, PoiKey, WorldPosition,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn distance_matches_expectation() {
        let origin = WorldPosition::new(0.0, 0.0, 0.0);
        let destination = WorldPosition::new(3.0, 0.0, 4.0);
        assert!((origin.distance(destination) - 5.0).abs() < f32::EPSILON);
        assert!((destination.distance(origin) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn distance_includes_elevation() {
        let low = WorldPosition::new(1.0, 0.0, 1.0);
        let high = WorldPosition::new(1.0, 2.0, 1.0);
        assert!((low.distance(high) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn movement_state_tracks_every_flag_combination() {
        for bits in 0u8..16 {
            let input = InputSnapshot {
                forward: bits & 0b0001 != 0,
                backward: bits & 0b0010 != 0,
                left: bits & 0b0100 != 0,
                right: bits & 0b1000 != 0,
            };
            let expected = if bits == 0 {
                MovementState::Idle
            } else {
                MovementState::Moving
            };
            assert_eq!(MovementState::from_input(input), expected, "bits {bits:04b}");
        }
    }

    #[test]
    fn snapshot_with_sets_single_direction() {
        let input = InputSnapshot::RELEASED.with(Direction::Left, true);
        for direction in Direction::ALL {
            assert_eq!(input.is_held(direction), direction == Direction::Left);
        }
        assert!(!input.with(Direction::Left, false).any_held());
    }

    #[test]
    fn clip_names_resolve_with_and_without_armature_prefix() {
        assert_eq!(
            AnimationClip::from_asset_name("CharacterArmature|Run"),
            Some(AnimationClip::Run)
        );
        assert_eq!(
            AnimationClip::from_asset_name("CharacterArmature|Idle"),
            Some(AnimationClip::Idle)
        );
        assert_eq!(AnimationClip::from_asset_name("Idle"), Some(AnimationClip::Idle));
        assert_eq!(AnimationClip::from_asset_name("CharacterArmature|Wave"), None);
    }

    #[test]
    fn clip_follows_movement_state() {
        assert_eq!(
            AnimationClip::for_movement(MovementState::Idle),
            AnimationClip::Idle
        );
        assert_eq!(
            AnimationClip::for_movement(MovementState::Moving),
            AnimationClip::Run
        );
    }

    #[test]
    fn poi_keys_order_lexicographically() {
        assert!(PoiKey::new("fly") < PoiKey::new("grebe"));
        assert!(PoiKey::new("coyote") < PoiKey::new("nest"));
    }

    #[test]
    fn world_position_round_trips_through_bincode() {
        assert_round_trip(&WorldPosition::new(2.2, 0.5, 1.0));
    }

    #[test]
    fn poi_key_round_trips_through_bincode() {
        assert_round_trip(&PoiKey::new("osprey"));
    }

    #[test]
    fn direction_round_trips_through_bincode() {
        assert_round_trip(&Direction::Backward);
    }
}
