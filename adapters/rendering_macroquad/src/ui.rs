//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use monolake_rendering::InfoPanel;

/// Outcome of drawing the overlay for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OverlayUiResult {
    /// Whether the panel's close button was pressed during this frame.
    pub dismiss_pressed: bool,
}

/// One row of the focus legend.
#[derive(Clone, Debug)]
pub(crate) struct LegendEntry<'a> {
    /// Number key that jumps to the marker.
    pub shortcut: usize,
    /// Marker label.
    pub label: &'a str,
    /// Whether the avatar is standing near the marker.
    pub nearby: bool,
}

/// Snapshot of the overlay's layout and text for the current frame.
#[derive(Clone, Debug)]
pub(crate) struct OverlayUiContext<'a> {
    /// Screen dimensions used to anchor the windows.
    pub screen: Vec2,
    /// Background colour applied to the window skin.
    pub background: Color,
    /// Banner shown at the top of the legend.
    pub caption: &'a str,
    /// Lake condition lines.
    pub status: &'a [String],
    /// Markers in focus order.
    pub legend: Vec<LegendEntry<'a>>,
    /// Asset failure notices.
    pub notices: &'a [String],
    /// Panel opened by the last activation.
    pub panel: Option<&'a InfoPanel>,
}

const LEGEND_SIZE: Vec2 = Vec2::new(300.0, 400.0);
const PANEL_SIZE: Vec2 = Vec2::new(360.0, 220.0);
const MARGIN: f32 = 16.0;

/// Draws the legend window and, when present, the info panel.
pub(crate) fn draw_overlay_ui(ui: &mut Ui, context: OverlayUiContext<'_>) -> OverlayUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(12.0, 12.0, 12.0, 12.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 2.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(40, 70, 90, 255))
        .color_hovered(Color::from_rgba(60, 96, 120, 255))
        .color_clicked(Color::from_rgba(30, 56, 72, 255))
        .color_selected(Color::from_rgba(40, 70, 90, 255))
        .color_selected_hovered(Color::from_rgba(60, 96, 120, 255))
        .color_inactive(Color::from_rgba(30, 56, 72, 200))
        .margin(RectOffset::new(0.0, 0.0, 6.0, 6.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let _ = ui.window(
        hash!("legend"),
        Vec2::new(MARGIN, MARGIN),
        LEGEND_SIZE,
        |ui| {
            ui.label(None, context.caption);
            for line in context.status {
                ui.label(None, line.as_str());
            }
            ui.label(None, "Arrows/WASD move, Enter inspects");
            ui.label(None, "[ and ] change the water level");
            for entry in &context.legend {
                let marker = if entry.nearby { ">" } else { " " };
                let line = format!("{marker} {} {}", entry.shortcut, entry.label);
                ui.label(None, line.as_str());
            }
            for notice in context.notices {
                ui.label(None, notice.as_str());
            }
        },
    );

    let mut dismiss_pressed = false;
    if let Some(panel) = context.panel {
        let origin = Vec2::new(
            (context.screen.x - PANEL_SIZE.x - MARGIN).max(MARGIN),
            (context.screen.y - PANEL_SIZE.y - MARGIN).max(MARGIN),
        );
        let _ = ui.window(hash!("info_panel"), origin, PANEL_SIZE, |ui| {
            ui.label(None, panel.title.as_str());
            for line in wrap_text(&panel.description, 42) {
                ui.label(None, line.as_str());
            }
            dismiss_pressed = ui.button(None, "Close");
        });
    }

    ui.pop_skin();

    OverlayUiResult { dismiss_pressed }
}

/// Greedily wraps `text` into lines no longer than `width` characters.
///
/// Words longer than `width` occupy a line of their own.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
