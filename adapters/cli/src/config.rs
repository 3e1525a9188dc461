//! TOML configuration for the Mono Lake explorer.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use monolake_core::{Direction, DEFAULT_DISPLACEMENT_SCALE, WELCOME_BANNER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up in the working directory when no path is supplied.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "monolake.toml";

/// How far `1 / step` may stray from a whole number before the step is rejected.
const STEP_TOLERANCE: f32 = 1e-3;

/// Errors raised while reading or validating the configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read configuration at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("water level range {min}..={max} is empty or not finite")]
    InvalidWaterRange { min: f32, max: f32 },
    #[error("water level step {step} must divide one unit into a whole number of steps")]
    InvalidWaterStep { step: f32 },
    #[error("initial water level {level} lies outside {min}..={max}")]
    WaterLevelOutOfRange { level: f32, min: f32, max: f32 },
    #[error("displacement scale {scale} must be finite and positive")]
    InvalidDisplacementScale { scale: f32 },
    #[error("headless tick rate must be positive")]
    InvalidTickRate,
    #[error("habitat key must not be empty")]
    EmptyHabitatKey,
    #[error("habitat `{key}` is declared more than once")]
    DuplicateHabitat { key: String },
    #[error("habitat `{key}` has a non-finite position")]
    InvalidHabitatPosition { key: String },
    #[error("script step at tick {tick} focuses unknown habitat `{key}`")]
    UnknownScriptTarget { tick: u64, key: String },
}

/// Root of the configuration file.
///
/// Declaring any `[[habitats]]` replaces the built-in catalog entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) window: WindowConfig,
    pub(crate) assets: AssetsConfig,
    pub(crate) lake: LakeConfig,
    pub(crate) headless: HeadlessConfig,
    pub(crate) habitats: Vec<HabitatConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetsConfig::default(),
            lake: LakeConfig::default(),
            headless: HeadlessConfig::default(),
            habitats: default_habitats(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: WELCOME_BANNER.trim_end_matches('.').to_owned(),
            vsync: true,
            show_fps: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AssetsConfig {
    /// Grayscale image whose red channel encodes terrain elevation.
    pub(crate) height_map: PathBuf,
    pub(crate) displacement_scale: f32,
    /// Clip names exported by the avatar model.
    pub(crate) avatar_clips: Vec<String>,
    /// Cells per side of the rendered terrain grid.
    pub(crate) terrain_resolution: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            height_map: PathBuf::from("assets/monomerge.png"),
            displacement_scale: DEFAULT_DISPLACEMENT_SCALE,
            avatar_clips: vec![
                "CharacterArmature|Idle".to_owned(),
                "CharacterArmature|Run".to_owned(),
            ],
            terrain_resolution: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LakeConfig {
    pub(crate) water_level: f32,
    pub(crate) min_level: f32,
    pub(crate) max_level: f32,
    pub(crate) step: f32,
    /// Below this level the land bridge is exposed.
    pub(crate) low_water_threshold: f32,
}

impl Default for LakeConfig {
    fn default() -> Self {
        Self {
            water_level: 0.19,
            min_level: 0.14,
            max_level: 0.24,
            step: 0.01,
            low_water_threshold: 0.18,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HeadlessConfig {
    pub(crate) ticks: u64,
    pub(crate) tick_rate_hz: u32,
    pub(crate) script: Vec<ScriptStep>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        let step = |tick, action| ScriptStep { tick, action };
        Self {
            ticks: 240,
            tick_rate_hz: 60,
            script: vec![
                step(0, ScriptAction::Press {
                    direction: Direction::Forward,
                }),
                step(30, ScriptAction::Release {
                    direction: Direction::Forward,
                }),
                step(40, ScriptAction::Focus {
                    key: "osprey".to_owned(),
                }),
                step(42, ScriptAction::Activate),
                step(60, ScriptAction::Dismiss),
                step(80, ScriptAction::WaterLevel { level: 0.16 }),
                step(90, ScriptAction::Focus {
                    key: "coyote".to_owned(),
                }),
                step(92, ScriptAction::Activate),
                step(120, ScriptAction::Press {
                    direction: Direction::Right,
                }),
                step(180, ScriptAction::Release {
                    direction: Direction::Right,
                }),
            ],
        }
    }
}

/// Scripted input applied before the tick with the same index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) action: ScriptAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ScriptAction {
    Press { direction: Direction },
    Release { direction: Direction },
    Activate,
    Dismiss,
    Focus { key: String },
    WaterLevel { level: f32 },
}

/// Which water levels a habitat is visible at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum WaterCondition {
    #[default]
    Always,
    /// Only while the level is below the low-water threshold.
    LowWater,
    /// Only while the level is at or above the low-water threshold.
    HighWater,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct HabitatConfig {
    pub(crate) key: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: [f32; 3],
    #[serde(default)]
    pub(crate) visible: WaterCondition,
}

impl HabitatConfig {
    fn new(key: &str, title: &str, description: &str, position: [f32; 3]) -> Self {
        Self {
            key: key.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
            position,
            visible: WaterCondition::Always,
        }
    }

    fn visible(mut self, visible: WaterCondition) -> Self {
        self.visible = visible;
        self
    }
}

impl Config {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parses and validates configuration text; `origin` is only used for error reporting.
    pub(crate) fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants that serde cannot express.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let lake = &self.lake;
        if !lake.min_level.is_finite()
            || !lake.max_level.is_finite()
            || lake.min_level >= lake.max_level
        {
            return Err(ConfigError::InvalidWaterRange {
                min: lake.min_level,
                max: lake.max_level,
            });
        }
        let steps_per_unit = 1.0 / lake.step;
        if !lake.step.is_finite()
            || lake.step <= 0.0
            || lake.step > lake.max_level - lake.min_level
            || (steps_per_unit - steps_per_unit.round()).abs() > STEP_TOLERANCE
        {
            return Err(ConfigError::InvalidWaterStep { step: lake.step });
        }
        if !(lake.min_level..=lake.max_level).contains(&lake.water_level) {
            return Err(ConfigError::WaterLevelOutOfRange {
                level: lake.water_level,
                min: lake.min_level,
                max: lake.max_level,
            });
        }

        let scale = self.assets.displacement_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::InvalidDisplacementScale { scale });
        }
        if self.headless.tick_rate_hz == 0 {
            return Err(ConfigError::InvalidTickRate);
        }

        let mut keys = BTreeSet::new();
        for habitat in &self.habitats {
            if habitat.key.trim().is_empty() {
                return Err(ConfigError::EmptyHabitatKey);
            }
            if !keys.insert(habitat.key.as_str()) {
                return Err(ConfigError::DuplicateHabitat {
                    key: habitat.key.clone(),
                });
            }
            if habitat.position.iter().any(|axis| !axis.is_finite()) {
                return Err(ConfigError::InvalidHabitatPosition {
                    key: habitat.key.clone(),
                });
            }
        }

        for step in &self.headless.script {
            if let ScriptAction::Focus { key } = &step.action {
                if !keys.contains(key.as_str()) {
                    return Err(ConfigError::UnknownScriptTarget {
                        tick: step.tick,
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn default_habitats() -> Vec<HabitatConfig> {
    vec![
        HabitatConfig::new(
            "grebe",
            "Eared Grebe",
            "If it looks like a duck, it might just be an eared grebe instead. Around one to two \
             million grebes stop at Mono Lake in the fall, making them the lake's most common \
             bird. They feed on brine shrimp and alkali flies before migrating south for the winter.",
            [0.5, 0.5, -3.0],
        ),
        HabitatConfig::new(
            "sandpiper",
            "Wilson's Phalarope",
            "A small migratory bird that feeds on brine shrimp and alkali flies. Phalaropes swim \
             in tight circles, creating whirlpools that pull in their prey. Tens of thousands \
             arrive late in the summer before a non-stop flight to South America.",
            [2.2, 0.5, 1.0],
        ),
        HabitatConfig::new(
            "fly",
            "Alkali Fly",
            "Alkali flies dive underwater inside a bubble of trapped air to feed on algae and lay \
             eggs. In summer they carpet the shoreline, and their enormous population draws \
             millions of birds to the lake.",
            [2.6, 0.5, -2.6],
        ),
        HabitatConfig::new(
            "osprey",
            "Osprey",
            "The lake is too salty for fish, yet dozens of ospreys nest on its tufa towers to keep \
             their eggs safe from predators. They commute to nearby freshwater lakes to hunt.",
            [0.0, 1.0, 4.0],
        ),
        HabitatConfig::new(
            "shrimp",
            "Brine Shrimp",
            "Artemia monica lives nowhere else on Earth. Trillions of these crustaceans filter \
             algae from the open water and form the base of the food web. Rising salinity \
             threatens their ability to grow and reproduce.",
            [-2.0, 0.5, 0.4],
        ),
        HabitatConfig::new(
            "nest",
            "California Gull Nest",
            "Around 50,000 California gulls nest at Mono Lake each summer, many near Negit \
             Island. Try lowering the water level to see what happens to these nests.",
            [-0.5, 1.0, -1.1],
        )
        .visible(WaterCondition::HighWater),
        HabitatConfig::new(
            "coyote",
            "Coyote",
            "When the water level is low a land bridge is exposed, letting coyotes reach Negit \
             Island and feast on gull eggs.",
            [-0.5, 1.0, -1.1],
        )
        .visible(WaterCondition::LowWater),
    ]
}
