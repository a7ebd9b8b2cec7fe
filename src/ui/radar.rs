// Radar rendering module
//
// Renders the network map: range rings, crosshair, rotating sweep arm and
// one marker per device. Marker positions are recomputed from the current
// canvas layout on every frame.

use crate::app::AppState;
use crate::device::{DeviceStatus, NetworkDevice};
use crate::radar::layout::{CanvasBounds, RING_FACTORS};
use crate::radar::{device_position, RadarLayout};
use crate::theme::status::status_icon;
use crate::theme::{
    dim, status_color, ACCENT_VIOLET, GRID_CYAN, ONLINE_GREEN, RADAR_CYAN, TEXT_MUTED,
    UNKNOWN_AMBER,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, BorderType, Borders,
    },
    Frame,
};
use std::f32::consts::TAU;
use unicode_width::UnicodeWidthStr;

/// Degrees between the dots of a range ring
const RING_DOT_STEP: usize = 6;

/// Trailing copies of the sweep arm, each a little behind and dimmer
const SWEEP_TRAIL: [(f32, f32); 3] = [(0.0, 1.0), (0.012, 0.55), (0.024, 0.3)];

/// Radius of the selection ring in canvas units
const SELECTION_RING_RADIUS: f64 = 3.5;

/// Widest label printed next to a marker, in terminal columns
const MAX_LABEL_COLS: usize = 16;

const EMPTY_MESSAGE: &str = "No devices found. Press n to scan";
const SCANNING_MESSAGE: &str = "SCANNING…";

/// One device as drawn on the radar
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RadarMarker {
    /// Canvas-space position
    pub x: f64,
    pub y: f64,
    pub glyph: &'static str,
    pub color: Color,
    pub label: Option<String>,
    pub selected: bool,
}

/// Marker color; online devices breathe with the pulse phase
pub(crate) fn marker_color(status: DeviceStatus, pulse_phase: f32) -> Color {
    match status {
        DeviceStatus::Online => {
            let wave = 0.5 + 0.5 * (pulse_phase * TAU).sin();
            dim(ONLINE_GREEN, 0.6 + 0.4 * wave)
        }
        other => status_color(other),
    }
}

/// Markers for every device the radar shows
pub(crate) fn build_markers(app: &AppState, layout: &RadarLayout) -> Vec<RadarMarker> {
    let selected_id = app.selected_id.as_deref();
    app.radar_devices()
        .into_iter()
        .map(|device| marker_for(device, layout, app, selected_id == Some(device.id.as_str())))
        .collect()
}

fn marker_for(
    device: &NetworkDevice,
    layout: &RadarLayout,
    app: &AppState,
    selected: bool,
) -> RadarMarker {
    let position = device_position(device, layout);
    let (x, y) = layout.to_canvas(position.x, position.y);

    let label = (app.radar_settings.labels_enabled || selected)
        .then(|| super::truncate_to_width(device.display_name(), MAX_LABEL_COLS));

    RadarMarker {
        x,
        y,
        glyph: if selected { "◉" } else { status_icon(device.status) },
        color: marker_color(device.status, app.pulse_phase),
        label,
        selected,
    }
}

pub fn render_radar(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    layout: &RadarLayout,
    bounds: &CanvasBounds,
) {
    let markers = build_markers(app, layout);
    let online = app
        .radar_devices()
        .iter()
        .filter(|d| d.status == DeviceStatus::Online)
        .count();

    let block = Block::default()
        .title(vec![
            Span::styled(
                "━ ◎ Network Map ",
                Style::default().fg(RADAR_CYAN).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("({} shown, {} online) ", markers.len(), online),
                Style::default().fg(TEXT_MUTED),
            ),
            Span::styled("━━━━", Style::default().fg(RADAR_CYAN)),
        ])
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(GRID_CYAN));

    // Canvas units per terminal column, for centering and label offsets
    let inner = block.inner(area);
    let col_unit = (bounds.x[1] - bounds.x[0]) / f64::from(inner.width.max(1));

    let layout = *layout;
    let sweep_enabled = app.radar_settings.sweep_enabled;
    let sweep_phase = app.sweep_phase;
    let is_scanning = app.store.is_scanning();
    let is_empty = app.store.is_empty();
    let blink_on = app.pulse_phase < 0.5;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(bounds.x)
        .y_bounds(bounds.y)
        .paint(move |ctx| {
            let (cx, cy) = (layout.center_x, layout.center_y);
            let r = layout.max_radius;

            // Rings, outer ones dimmer
            for (idx, factor) in RING_FACTORS.iter().enumerate() {
                let coords = layout.ring_points(*factor, RING_DOT_STEP);
                ctx.draw(&Points {
                    coords: &coords,
                    color: dim(GRID_CYAN, 1.0 - idx as f32 * 0.15),
                });
            }

            // Crosshair
            ctx.draw(&CanvasLine {
                x1: cx - r,
                y1: cy,
                x2: cx + r,
                y2: cy,
                color: dim(GRID_CYAN, 0.6),
            });
            ctx.draw(&CanvasLine {
                x1: cx,
                y1: cy - r,
                x2: cx,
                y2: cy + r,
                color: dim(GRID_CYAN, 0.6),
            });

            ctx.layer();

            if sweep_enabled {
                for (lag, brightness) in SWEEP_TRAIL.iter().rev() {
                    let (tx, ty) = layout.sweep_tip(sweep_phase - lag);
                    ctx.draw(&CanvasLine {
                        x1: cx,
                        y1: cy,
                        x2: tx,
                        y2: ty,
                        color: dim(RADAR_CYAN, *brightness),
                    });
                }
            }

            // Hub
            ctx.draw(&Circle {
                x: cx,
                y: cy,
                radius: (r * 0.03).max(0.8),
                color: RADAR_CYAN,
            });

            for marker in markers.iter().filter(|m| m.selected) {
                ctx.draw(&Circle {
                    x: marker.x,
                    y: marker.y,
                    radius: SELECTION_RING_RADIUS,
                    color: ACCENT_VIOLET,
                });
            }

            ctx.layer();

            for marker in &markers {
                let style = if marker.selected {
                    Style::default().fg(ACCENT_VIOLET).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(marker.color)
                };
                ctx.print(marker.x, marker.y, Span::styled(marker.glyph, style));

                if let Some(label) = &marker.label {
                    ctx.print(
                        marker.x + 2.0 * col_unit,
                        marker.y,
                        Span::styled(label.clone(), Style::default().fg(TEXT_MUTED)),
                    );
                }
            }

            if is_empty && !is_scanning {
                let half = EMPTY_MESSAGE.width() as f64 / 2.0 * col_unit;
                ctx.print(
                    cx - half,
                    cy - r * 0.5,
                    Span::styled(
                        EMPTY_MESSAGE,
                        Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
                    ),
                );
            }

            if is_scanning {
                let half = SCANNING_MESSAGE.width() as f64 / 2.0 * col_unit;
                let mut style = Style::default().fg(UNKNOWN_AMBER);
                if blink_on {
                    style = style.add_modifier(Modifier::BOLD);
                }
                ctx.print(
                    cx - half,
                    cy + r * 0.92,
                    Span::styled(SCANNING_MESSAGE, style),
                );
            }
        });

    f.render_widget(canvas, area);
}
