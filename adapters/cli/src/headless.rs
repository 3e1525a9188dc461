//! Deterministic scripted run without a window.

use std::{fmt, time::Duration};

use monolake_assets::{load_height_field, resolve_clips};
use monolake_core::{AssetKind, AvatarPose, Command, Event, PoiKey};
use monolake_world::query;
use tracing::{debug, info};

use crate::{
    config::{Config, ScriptAction, ScriptStep},
    simulation::Simulation,
};

/// Summary of a headless run, printed once the script finishes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HeadlessReport {
    pub(crate) banner: &'static str,
    pub(crate) ticks: u64,
    pub(crate) events: usize,
    pub(crate) final_pose: AvatarPose,
    pub(crate) nearby: Option<PoiKey>,
    pub(crate) selections: Vec<PoiKey>,
    pub(crate) water_level: f32,
    pub(crate) notices: Vec<String>,
}

impl fmt::Display for HeadlessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.banner)?;
        writeln!(f, "ticks: {}", self.ticks)?;
        writeln!(f, "events: {}", self.events)?;
        let position = self.final_pose.position();
        writeln!(
            f,
            "avatar: x={:.3} y={:.3} z={:.3} heading={:.3}",
            position.x(),
            position.y(),
            position.z(),
            self.final_pose.heading()
        )?;
        match &self.nearby {
            Some(key) => writeln!(f, "nearby: {key}")?,
            None => writeln!(f, "nearby: none")?,
        }
        let selections: Vec<&str> = self.selections.iter().map(PoiKey::as_str).collect();
        writeln!(f, "selections: [{}]", selections.join(", "))?;
        writeln!(f, "water level: {:.2}", self.water_level)?;
        for notice in &self.notices {
            writeln!(f, "notice: {notice}")?;
        }
        Ok(())
    }
}

/// Installs the assets synchronously so every run sees them on the same tick.
fn install_assets(simulation: &mut Simulation, config: &Config) {
    let assets = &config.assets;
    match load_height_field(&assets.height_map, assets.displacement_scale) {
        Ok(field) => simulation.submit(Command::InstallHeightField { field }),
        Err(error) => simulation.submit(Command::ReportAssetUnavailable {
            asset: AssetKind::HeightField,
            reason: error.to_string(),
        }),
    }

    let resolution = resolve_clips(assets.avatar_clips.iter().map(String::as_str));
    for command in resolution.into_commands() {
        simulation.submit(command);
    }
}

fn apply_step(simulation: &mut Simulation, step: &ScriptStep) {
    debug!(tick = step.tick, action = ?step.action, "script step");
    match &step.action {
        ScriptAction::Press { direction } => simulation.set_direction(*direction, true),
        ScriptAction::Release { direction } => simulation.set_direction(*direction, false),
        ScriptAction::Activate => simulation.activate(),
        ScriptAction::Dismiss => simulation.dismiss(),
        ScriptAction::Focus { key } => {
            let _ = simulation.focus_key(key);
        }
        ScriptAction::WaterLevel { level } => simulation.set_water_level(*level),
    }
}

/// Replays the configured script for the configured number of ticks.
pub(crate) fn run(config: &Config) -> HeadlessReport {
    let headless = &config.headless;
    let dt = Duration::from_secs_f64(1.0 / f64::from(headless.tick_rate_hz.max(1)));

    let mut script: Vec<&ScriptStep> = headless.script.iter().collect();
    script.sort_by_key(|step| step.tick);
    let mut script = script.into_iter().peekable();

    let mut simulation = Simulation::new(config);
    install_assets(&mut simulation, config);

    let mut events = 0;
    let mut selections = Vec::new();
    let mut last_selection: Option<PoiKey> = None;

    for tick in 0..headless.ticks {
        while let Some(step) = script.next_if(|step| step.tick <= tick) {
            apply_step(&mut simulation, step);
        }

        let batch = simulation.advance(dt);
        events += batch.len();
        for event in batch {
            if let Event::NearbyPointChanged { key } = event {
                debug!(tick, nearby = ?key.as_ref().map(PoiKey::as_str), "nearby point changed");
            }
        }

        let selected = simulation.selection().map(|selection| selection.key.clone());
        if selected.is_some() && selected != last_selection {
            selections.extend(selected.clone());
        }
        last_selection = selected;
    }

    let world = simulation.world();
    let report = HeadlessReport {
        banner: query::welcome_banner(world),
        ticks: query::tick_index(world),
        events,
        final_pose: query::avatar_pose(world),
        nearby: query::nearby_point(world).cloned(),
        selections,
        water_level: simulation.water_level(),
        notices: simulation.notices().to_vec(),
    };
    info!(ticks = report.ticks, events = report.events, "headless run finished");
    report
}
