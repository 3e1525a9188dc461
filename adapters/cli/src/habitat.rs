//! Habitat catalog, water gauge and the lake indicators derived from it.

use monolake_core::{PoiKey, PointOfInterest, WorldPosition};

use crate::config::{HabitatConfig, LakeConfig, WaterCondition};

/// Point of interest together with the payload shown when it is inspected.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Habitat {
    pub(crate) key: PoiKey,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: WorldPosition,
    visible: WaterCondition,
}

impl Habitat {
    fn from_config(config: &HabitatConfig) -> Self {
        let [x, y, z] = config.position;
        Self {
            key: PoiKey::new(config.key.as_str()),
            title: config.title.clone(),
            description: config.description.clone(),
            position: WorldPosition::new(x, y, z),
            visible: config.visible,
        }
    }

    fn is_visible(&self, land_bridge_exposed: bool) -> bool {
        match self.visible {
            WaterCondition::Always => true,
            WaterCondition::LowWater => land_bridge_exposed,
            WaterCondition::HighWater => !land_bridge_exposed,
        }
    }
}

/// Every habitat the experience knows about, in display order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HabitatCatalog {
    habitats: Vec<Habitat>,
    low_water_threshold: f32,
}

impl HabitatCatalog {
    pub(crate) fn new(habitats: &[HabitatConfig], low_water_threshold: f32) -> Self {
        Self {
            habitats: habitats.iter().map(Habitat::from_config).collect(),
            low_water_threshold,
        }
    }

    /// Reports whether the land bridge to Negit Island is above water.
    pub(crate) fn land_bridge_exposed(&self, water_level: f32) -> bool {
        water_level < self.low_water_threshold
    }

    /// Habitats visible at `water_level`, in display order.
    pub(crate) fn active(&self, water_level: f32) -> impl Iterator<Item = &Habitat> + '_ {
        let exposed = self.land_bridge_exposed(water_level);
        self.habitats
            .iter()
            .filter(move |habitat| habitat.is_visible(exposed))
    }

    /// Registry contents for `water_level`.
    pub(crate) fn points(&self, water_level: f32) -> Vec<PointOfInterest> {
        self.active(water_level)
            .map(|habitat| PointOfInterest::new(habitat.key.clone(), habitat.position))
            .collect()
    }

    /// Looks up the payload for `key`, regardless of the current water level.
    pub(crate) fn lookup(&self, key: &str) -> Option<&Habitat> {
        self.habitats
            .iter()
            .find(|habitat| habitat.key.as_str() == key)
    }
}

/// Water level quantised onto the configured step so repeated nudges land on
/// exactly the values a configuration file would spell out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WaterGauge {
    steps: i32,
    min_steps: i32,
    max_steps: i32,
    steps_per_unit: f32,
}

impl WaterGauge {
    pub(crate) fn new(lake: &LakeConfig) -> Self {
        let steps_per_unit = (1.0 / lake.step).round().max(1.0);
        let quantise = |level: f32| (level * steps_per_unit).round() as i32;
        let min_steps = quantise(lake.min_level);
        let max_steps = quantise(lake.max_level).max(min_steps);
        Self {
            steps: quantise(lake.water_level).clamp(min_steps, max_steps),
            min_steps,
            max_steps,
            steps_per_unit,
        }
    }

    pub(crate) fn level(&self) -> f32 {
        self.steps as f32 / self.steps_per_unit
    }

    /// Moves the level by `delta` steps; returns whether it changed.
    pub(crate) fn nudge(&mut self, delta: i32) -> bool {
        let steps = self
            .steps
            .saturating_add(delta)
            .clamp(self.min_steps, self.max_steps);
        let changed = steps != self.steps;
        self.steps = steps;
        changed
    }

    /// Moves the level to the step nearest `level`; returns whether it changed.
    pub(crate) fn set(&mut self, level: f32) -> bool {
        if !level.is_finite() {
            return false;
        }
        let target = (level * self.steps_per_unit).round() as i32;
        self.nudge(target.saturating_sub(self.steps))
    }
}

/// Lake health readouts derived from the water level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LakeIndicators {
    pub(crate) elevation_feet: i32,
    pub(crate) salinity_grams_per_litre: i32,
    pub(crate) bird_population_millions: f32,
    pub(crate) shrimp_population_trillions: f32,
}

impl LakeIndicators {
    pub(crate) fn at(water_level: f32) -> Self {
        Self {
            elevation_feet: (6350.0 + water_level / 0.6 * 100.0).round() as i32,
            salinity_grams_per_litre: (81.0 * (0.19 + 0.1) / (water_level + 0.1)).round() as i32,
            bird_population_millions: water_level / 0.1 * 3.2,
            shrimp_population_trillions: water_level / 0.19 * 5.0,
        }
    }

    pub(crate) fn lines(&self, land_bridge_exposed: bool) -> Vec<String> {
        let mut lines = vec![
            format!("Lake level: {} ft", self.elevation_feet),
            format!("Salinity: {} g/L", self.salinity_grams_per_litre),
            format!("Birds: {:.2} million", self.bird_population_millions),
            format!("Brine shrimp: {:.2} trillion", self.shrimp_population_trillions),
        ];
        if land_bridge_exposed {
            lines.push("Land bridge exposed: coyotes can reach the gull colony".to_owned());
        }
        lines
    }
}
