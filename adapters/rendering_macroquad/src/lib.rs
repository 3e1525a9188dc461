#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Mono Lake.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The lake is drawn with macroquad's 3D primitives: terrain columns, a
//! translucent water plane, a box avatar and spherical markers. Text lives in
//! the local `ui` module so macroquad UI types stay out of the renderer.

mod ui;

use self::ui::{draw_overlay_ui, LegendEntry, OverlayUiContext, OverlayUiResult};
use anyhow::{ensure, Result};
use glam::{Vec2, Vec3};
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_down, is_key_pressed, KeyCode},
    math::{vec2 as mq_vec2, vec3 as mq_vec3, Vec3 as MacroquadVec3},
    models::{draw_cube, draw_cube_wires, draw_line_3d, draw_plane, draw_sphere},
};
use monolake_core::{AnimationClip, InputSnapshot, WorldPosition};
use monolake_rendering::{
    AvatarPresentation, CameraPresentation, Color, FrameInput, MarkerPresentation, Presentation,
    RenderingBackend, Scene, TerrainPresentation, WaterAdjustment, WaterPresentation,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::info;

/// Tracks UI-sourced interactions so they can be merged with keyboard input on the next frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanelInputState {
    dismiss: bool,
}

impl PanelInputState {
    /// Returns whether a dismiss press is pending and clears it.
    #[must_use]
    pub fn take_dismiss(&mut self) -> bool {
        std::mem::take(&mut self.dismiss)
    }

    /// Latches a dismiss press until the next frame consumes it.
    pub fn register_dismiss(&mut self) {
        self.dismiss = true;
    }
}

/// Keyboard state observed during a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    /// Arrow keys or WASD currently held.
    pub held: InputSnapshot,
    /// `Enter` inspects the nearby marker.
    pub activate: bool,
    /// Zero-based index of the number key pressed, `1` mapping to `0`.
    pub digit: Option<usize>,
    /// `]` raises the water level.
    pub raise_water: bool,
    /// `[` lowers the water level.
    pub lower_water: bool,
    /// `Backspace` closes the info panel.
    pub dismiss: bool,
    /// `Q` or `Escape` quits the loop.
    pub quit_requested: bool,
}

const DIGIT_KEYS: [KeyCode; 9] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

impl KeyboardState {
    fn poll() -> Self {
        let held = InputSnapshot {
            forward: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            backward: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
        };

        Self {
            held,
            activate: is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter),
            digit: DIGIT_KEYS.iter().position(|key| is_key_pressed(*key)),
            raise_water: is_key_pressed(KeyCode::RightBracket),
            lower_water: is_key_pressed(KeyCode::LeftBracket),
            dismiss: is_key_pressed(KeyCode::Backspace),
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
        }
    }

    /// Converts the observed keys into the frame input handed to the simulation.
    ///
    /// Number keys beyond the marker count are ignored, and pressing both water
    /// keys on the same frame cancels out.
    #[must_use]
    pub fn into_frame_input(self, marker_count: usize, ui_dismiss: bool) -> FrameInput {
        let water_adjustment = match (self.raise_water, self.lower_water) {
            (true, false) => Some(WaterAdjustment::Raise),
            (false, true) => Some(WaterAdjustment::Lower),
            _ => None,
        };

        FrameInput {
            held: self.held,
            activate: self.activate,
            focus: self.digit.filter(|index| *index < marker_count),
            water_adjustment,
            dismiss_panel: self.dismiss || ui_dismiss,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames.max(1),
            avg_render: self.render_accum / frames.max(1),
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            camera,
            scene,
        } = presentation;

        ensure!(
            camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0,
            "camera field of view must lie within (0, 180) degrees, received {}",
            camera.fov_degrees
        );

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1024,
            window_height: 768,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let overlay_background = to_macroquad_color(Color::new(0.05, 0.08, 0.12, 0.85));
            let mut fps_counter = FpsCounter::default();
            let mut panel_input = PanelInputState::default();

            loop {
                let keyboard = KeyboardState::poll();
                if keyboard.quit_requested {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input =
                    keyboard.into_frame_input(scene.markers.len(), panel_input.take_dismiss());

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation_duration = simulation_start.elapsed();

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                set_camera(&camera_3d(&camera));
                if let Some(terrain) = &scene.terrain {
                    draw_terrain(terrain);
                }
                draw_water(&scene.water);
                for marker in &scene.markers {
                    draw_marker(marker);
                }
                draw_avatar(&scene.avatar);

                set_default_camera();
                let screen = mq_vec2(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let legend = scene
                    .markers
                    .iter()
                    .enumerate()
                    .map(|(index, marker)| LegendEntry {
                        shortcut: index + 1,
                        label: marker.label.as_str(),
                        nearby: marker.nearby,
                    })
                    .collect();
                let mut overlay_ui = macroquad::ui::root_ui();
                let OverlayUiResult { dismiss_pressed } = draw_overlay_ui(
                    &mut overlay_ui,
                    OverlayUiContext {
                        screen,
                        background: overlay_background,
                        caption: scene.caption.as_str(),
                        status: &scene.status,
                        legend,
                        notices: &scene.notices,
                        panel: scene.panel.as_ref(),
                    },
                );
                drop(overlay_ui);
                if dismiss_pressed {
                    panel_input.register_dismiss();
                }
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            simulation_ms = avg_simulation.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn camera_3d(camera: &CameraPresentation) -> Camera3D {
    Camera3D {
        position: to_macroquad_vec3(camera.eye),
        target: to_macroquad_vec3(camera.target),
        up: mq_vec3(0.0, 1.0, 0.0),
        fovy: camera.fov_degrees.to_radians(),
        ..Camera3D::default()
    }
}

/// Thickness of the terrain slab drawn beneath elevation zero.
const TERRAIN_BASE: f32 = 0.2;

fn draw_terrain(terrain: &TerrainPresentation) {
    let length = terrain.cell_length();
    let peak = terrain.peak();
    for row in 0..terrain.resolution() {
        for column in 0..terrain.resolution() {
            let Some(elevation) = terrain.elevation(column, row) else {
                continue;
            };
            let (centre, size) = terrain_column(terrain.cell_centre(column, row), length, elevation);
            let color = terrain_shade(terrain.color, elevation, peak);
            draw_cube(
                to_macroquad_vec3(centre),
                to_macroquad_vec3(size),
                None,
                to_macroquad_color(color),
            );
        }
    }
}

/// Centre and size of the box spanning from below the ground up to `elevation`.
fn terrain_column(cell_centre: Vec2, length: f32, elevation: f32) -> (Vec3, Vec3) {
    let height = elevation + TERRAIN_BASE;
    let centre = Vec3::new(cell_centre.x, elevation - height * 0.5, cell_centre.y);
    (centre, Vec3::new(length, height, length))
}

/// Lightens higher terrain so relief stays readable without lighting.
fn terrain_shade(base: Color, elevation: f32, peak: f32) -> Color {
    if peak <= f32::EPSILON {
        return base;
    }
    base.lighten((elevation / peak).clamp(0.0, 1.0) * 0.5)
}

fn draw_water(water: &WaterPresentation) {
    draw_plane(
        mq_vec3(0.0, water.level, 0.0),
        mq_vec2(water.extent * 0.5, water.extent * 0.5),
        None,
        to_macroquad_color(water.color),
    );
}

const MARKER_RADIUS: f32 = 0.2;
const RING_SEGMENTS: usize = 32;

fn draw_marker(marker: &MarkerPresentation) {
    let centre = marker.animated_position();
    let color = if marker.nearby {
        marker.color.lighten(0.35)
    } else {
        marker.color
    };
    draw_sphere(
        to_macroquad_vec3(centre),
        MARKER_RADIUS * marker.scale,
        None,
        to_macroquad_color(color),
    );

    let ring_color = to_macroquad_color(ring_color(marker));
    let ring = ring_points(ring_anchor(marker.position), MARKER_RADIUS * 1.8, RING_SEGMENTS);
    for (start, end) in ring.iter().zip(ring.iter().cycle().skip(1)) {
        draw_line_3d(to_macroquad_vec3(*start), to_macroquad_vec3(*end), ring_color);
    }
}

/// Pale tint of the marker colour, faded by the pulse's ring opacity.
fn ring_color(marker: &MarkerPresentation) -> Color {
    marker
        .color
        .lighten(0.8)
        .with_alpha(marker.ring_opacity.clamp(0.0, 1.0))
}

/// The ring lies flat just above the marker's resting height.
fn ring_anchor(position: WorldPosition) -> Vec3 {
    Vec3::new(position.x(), position.y() - MARKER_RADIUS, position.z())
}

/// Points on a horizontal circle around `centre`, starting on the +x axis.
fn ring_points(centre: Vec3, radius: f32, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(3);
    (0..segments)
        .map(|index| {
            let angle = index as f32 / segments as f32 * std::f32::consts::TAU;
            centre + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

const AVATAR_SIZE: f32 = 0.35;

fn draw_avatar(avatar: &AvatarPresentation) {
    let position = avatar.pose.position();
    let body = Vec3::new(position.x(), position.y(), position.z());
    let color = match avatar.clip {
        Some(AnimationClip::Run) => avatar.color.lighten(0.25),
        Some(AnimationClip::Idle) | None => avatar.color,
    };
    draw_cube(
        to_macroquad_vec3(body),
        to_macroquad_vec3(Vec3::splat(AVATAR_SIZE)),
        None,
        to_macroquad_color(color),
    );
    draw_cube_wires(
        to_macroquad_vec3(body),
        to_macroquad_vec3(Vec3::splat(AVATAR_SIZE)),
        to_macroquad_color(avatar.color.lighten(0.6)),
    );

    let facing = heading_vector(avatar.pose.heading()) * AVATAR_SIZE * 0.6;
    let nose = body + Vec3::new(facing.x, AVATAR_SIZE * 0.15, facing.y);
    draw_cube(
        to_macroquad_vec3(nose),
        to_macroquad_vec3(Vec3::splat(AVATAR_SIZE * 0.3)),
        None,
        to_macroquad_color(avatar.color.lighten(0.5)),
    );
}

/// Planar unit vector (x, z) the avatar faces for a heading of `atan2(dx, dz)`.
fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.sin(), heading.cos())
}

fn to_macroquad_vec3(vector: Vec3) -> MacroquadVec3 {
    mq_vec3(vector.x, vector.y, vector.z)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
