#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Mono Lake adapters.

use anyhow::Result as AnyResult;
use glam::{Vec2, Vec3};
use monolake_core::{
    AnimationClip, AvatarPose, HeightField, InputSnapshot, PoiKey, WorldPosition,
    WORLD_HALF_EXTENT,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with its alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Direction in which the lake's water level was nudged during a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaterAdjustment {
    /// Lowers the water level by one step.
    Lower,
    /// Raises the water level by one step.
    Raise,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Directional keys currently held down.
    pub held: InputSnapshot,
    /// Whether the confirm key was pressed on this frame.
    pub activate: bool,
    /// Index into [`Scene::markers`] the user asked to jump to, if any.
    pub focus: Option<usize>,
    /// Water level change requested on this frame, if any.
    pub water_adjustment: Option<WaterAdjustment>,
    /// Whether the user closed the info panel on this frame.
    pub dismiss_panel: bool,
}

/// Square grid of terrain elevations covering the world footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainPresentation {
    resolution: u32,
    elevations: Vec<f32>,
    /// Base color used for the lowest terrain cells.
    pub color: Color,
}

impl TerrainPresentation {
    /// Creates a terrain grid with every cell at the same elevation.
    pub fn flat(resolution: u32, elevation: f32, color: Color) -> Result<Self, RenderingError> {
        if resolution == 0 {
            return Err(RenderingError::InvalidTerrainResolution { resolution });
        }

        let cells = resolution as usize * resolution as usize;
        Ok(Self {
            resolution,
            elevations: vec![elevation; cells],
            color,
        })
    }

    /// Samples the provided height field at the centre of every grid cell.
    pub fn from_height_field(
        field: &HeightField,
        resolution: u32,
        color: Color,
    ) -> Result<Self, RenderingError> {
        let mut terrain = Self::flat(resolution, 0.0, color)?;
        for row in 0..resolution {
            for column in 0..resolution {
                let centre = terrain.cell_centre(column, row);
                let elevation = field.sample_world(centre.x, centre.y).unwrap_or(0.0);
                let index = terrain.index(column, row);
                terrain.elevations[index] = elevation;
            }
        }
        Ok(terrain)
    }

    /// Number of cells along each side of the grid.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Side length of a single cell in world units.
    #[must_use]
    pub fn cell_length(&self) -> f32 {
        (2.0 * WORLD_HALF_EXTENT) / self.resolution as f32
    }

    /// Elevation of the cell at `column`, `row`.
    #[must_use]
    pub fn elevation(&self, column: u32, row: u32) -> Option<f32> {
        if column >= self.resolution || row >= self.resolution {
            return None;
        }
        self.elevations.get(self.index(column, row)).copied()
    }

    /// World-space x/z centre of the cell at `column`, `row`.
    #[must_use]
    pub fn cell_centre(&self, column: u32, row: u32) -> Vec2 {
        let length = self.cell_length();
        Vec2::new(
            -WORLD_HALF_EXTENT + (column as f32 + 0.5) * length,
            -WORLD_HALF_EXTENT + (row as f32 + 0.5) * length,
        )
    }

    /// Highest elevation across the grid.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.elevations.iter().copied().fold(0.0, f32::max)
    }

    fn index(&self, column: u32, row: u32) -> usize {
        row as usize * self.resolution as usize + column as usize
    }
}

/// Translucent water plane drawn at the lake's surface level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterPresentation {
    /// Elevation of the water surface.
    pub level: f32,
    /// Side length of the square plane.
    pub extent: f32,
    /// Fill color including translucency.
    pub color: Color,
}

impl WaterPresentation {
    /// Creates a new water plane descriptor.
    #[must_use]
    pub const fn new(level: f32, extent: f32, color: Color) -> Self {
        Self {
            level,
            extent,
            color,
        }
    }
}

/// Avatar snapshot copied out of the world once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarPresentation {
    /// Position and heading of the avatar.
    pub pose: AvatarPose,
    /// Clip currently playing, if the avatar asset provides one.
    pub clip: Option<AnimationClip>,
    /// Body color.
    pub color: Color,
}

/// Hoverable marker standing on a point of interest.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPresentation {
    /// Registry key of the point of interest.
    pub key: PoiKey,
    /// Short label drawn next to the marker.
    pub label: String,
    /// Resting position of the marker.
    pub position: WorldPosition,
    /// Whether the avatar is currently near this marker.
    pub nearby: bool,
    /// Vertical bob applied on top of the resting position.
    pub bob_offset: f32,
    /// Uniform scale of the marker body.
    pub scale: f32,
    /// Opacity of the ring drawn around the marker.
    pub ring_opacity: f32,
    /// Body color.
    pub color: Color,
}

impl MarkerPresentation {
    /// Creates a resting marker with no pulse applied.
    #[must_use]
    pub fn new(key: PoiKey, label: impl Into<String>, position: WorldPosition, color: Color) -> Self {
        Self {
            key,
            label: label.into(),
            position,
            nearby: false,
            bob_offset: 0.0,
            scale: 1.0,
            ring_opacity: 0.4,
            color,
        }
    }

    /// Position of the marker body after the bob offset.
    #[must_use]
    pub fn animated_position(&self) -> Vec3 {
        Vec3::new(
            self.position.x(),
            self.position.y() + self.bob_offset,
            self.position.z(),
        )
    }
}

/// Detail panel opened by the selection collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    /// Heading of the panel.
    pub title: String,
    /// Body text of the panel.
    pub description: String,
}

impl InfoPanel {
    /// Creates a new info panel.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Scene description combining terrain, water, avatar and markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Terrain grid; `None` until the height field has loaded.
    pub terrain: Option<TerrainPresentation>,
    /// Water plane.
    pub water: WaterPresentation,
    /// Avatar snapshot.
    pub avatar: AvatarPresentation,
    /// Markers in focus order.
    pub markers: Vec<MarkerPresentation>,
    /// Banner drawn across the top of the view.
    pub caption: String,
    /// Lines describing the lake's current condition.
    pub status: Vec<String>,
    /// Panel opened by the last activation, if any.
    pub panel: Option<InfoPanel>,
    /// Messages about assets that failed to load.
    pub notices: Vec<String>,
}

impl Scene {
    /// Creates a new scene descriptor with no terrain, markers or panel.
    #[must_use]
    pub fn new(caption: impl Into<String>, water: WaterPresentation, avatar: AvatarPresentation) -> Self {
        Self {
            terrain: None,
            water,
            avatar,
            markers: Vec::new(),
            caption: caption.into(),
            status: Vec::new(),
            panel: None,
            notices: Vec::new(),
        }
    }

    /// Marker for the point the avatar is currently near.
    #[must_use]
    pub fn nearby_marker(&self) -> Option<&MarkerPresentation> {
        self.markers.iter().find(|marker| marker.nearby)
    }
}

/// Perspective camera looking at the lake.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPresentation {
    /// Camera position.
    pub eye: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for CameraPresentation {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 6.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Camera used to view the scene.
    pub camera: CameraPresentation,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor with the default camera.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            camera: CameraPresentation::default(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Mono Lake scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta, per-frame
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Terrain grids need at least one cell per side.
    InvalidTerrainResolution {
        /// Provided resolution that failed validation.
        resolution: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTerrainResolution { resolution } => {
                write!(
                    f,
                    "terrain resolution must be positive (received {resolution})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
