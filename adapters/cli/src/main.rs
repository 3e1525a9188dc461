#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Mono Lake explorer.

mod config;
mod habitat;
mod headless;
mod simulation;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use monolake_assets::AssetLoader;
use monolake_rendering::{Color, Presentation, RenderingBackend};
use monolake_rendering_macroquad::MacroquadBackend;
use tracing::info;

use crate::{
    config::{Config, DEFAULT_CONFIG_FILE},
    simulation::Simulation,
};

const CLEAR_COLOR: Color = Color::from_rgb_u8(190, 214, 230);

#[derive(Parser, Debug)]
#[command(
    name = "monolake",
    version,
    about = "Walk the shores of Mono Lake and watch its habitats respond to the water level"
)]
struct Args {
    /// Configuration file; defaults to `monolake.toml` when it exists.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Overrides the terrain height image.
    #[arg(long)]
    height_map: Option<PathBuf>,
    /// Replays the configured script without opening a window.
    #[arg(long)]
    headless: bool,
    /// Overrides the number of ticks replayed in headless mode.
    #[arg(long)]
    ticks: Option<u64>,
    /// Disables vertical sync.
    #[arg(long)]
    no_vsync: bool,
    /// Logs frame timings once per second.
    #[arg(long)]
    show_fps: bool,
    /// Prints the built-in configuration as TOML and exits.
    #[arg(long)]
    print_default_config: bool,
}

/// Entry point for the Mono Lake command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.print_default_config {
        let text = toml::to_string_pretty(&Config::default())
            .context("failed to serialise the default configuration")?;
        print!("{text}");
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(height_map) = args.height_map {
        config.assets.height_map = height_map;
    }
    if let Some(ticks) = args.ticks {
        config.headless.ticks = ticks;
    }
    if args.no_vsync {
        config.window.vsync = false;
    }
    if args.show_fps {
        config.window.show_fps = true;
    }

    if args.headless {
        let report = headless::run(&config);
        print!("{report}");
        return Ok(());
    }

    run_interactive(config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::load(path)?);
    }

    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        info!(path = %fallback.display(), "loading configuration");
        Ok(Config::load(fallback)?)
    } else {
        Ok(Config::default())
    }
}

fn run_interactive(config: Config) -> Result<()> {
    let mut loader = AssetLoader::new();
    loader
        .request_height_field(
            config.assets.height_map.clone(),
            config.assets.displacement_scale,
        )
        .context("failed to start loading the terrain")?;
    loader
        .request_animation_clips(config.assets.avatar_clips.clone())
        .context("failed to start loading the avatar clips")?;

    let mut simulation = Simulation::new(&config);
    let presentation = Presentation::new(
        config.window.title.as_str(),
        CLEAR_COLOR,
        simulation.initial_scene(),
    );
    let backend = MacroquadBackend::new()
        .with_vsync(config.window.vsync)
        .with_show_fps(config.window.show_fps);

    let mut arrivals = Vec::new();
    backend.run(presentation, move |dt, input, scene| {
        loader.poll(&mut arrivals);
        for command in arrivals.drain(..) {
            simulation.submit(command);
        }
        let _ = simulation.handle_frame(dt, &input);
        simulation.populate_scene(scene);
    })
}
