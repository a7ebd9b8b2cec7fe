// UI rendering module
//
// This module contains all UI rendering components for netradar.
// The main draw() function orchestrates rendering of all UI panels.

mod device_list;
mod header;
mod inspector;
mod radar;
mod status_bar;

use crate::app::AppState;
use crate::radar::layout::{calculate_radar_layout, CanvasBounds};
use crate::radar::RadarLayout;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use device_list::render_device_list;
use header::render_header;
use inspector::render_device_inspector;
use radar::render_radar;
use status_bar::render_status_bar;

/// Main UI drawing function
pub fn draw(f: &mut Frame, app: &mut AppState) {
    let size = f.area();

    // Main layout: header, body, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Status bar
        ])
        .split(size);

    render_header(f, chunks[0], app);

    // Body: radar + right panels
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Radar
            Constraint::Percentage(40), // Right panels
        ])
        .split(chunks[1]);

    // Layout follows the radar's inner area so the inspector reports the
    // same coordinates the markers are drawn at
    let (layout, bounds) = radar_geometry(body_chunks[0]);
    render_radar(f, body_chunks[0], app, &layout, &bounds);

    // Right side: device list + inspector
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55), // Device list
            Constraint::Percentage(45), // Inspector
        ])
        .split(body_chunks[1]);

    render_device_list(f, right_chunks[0], app);
    render_device_inspector(f, right_chunks[1], app, &layout);

    render_status_bar(f, chunks[2], app);
}

/// Radar layout for the canvas inside a bordered panel
fn radar_geometry(area: Rect) -> (RadarLayout, CanvasBounds) {
    let cols = area.width.saturating_sub(2);
    let rows = area.height.saturating_sub(2);
    calculate_radar_layout(cols, rows)
}

/// Cut `text` to at most `max_cols` terminal columns, marking cuts with '…'
pub(crate) fn truncate_to_width(text: &str, max_cols: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_cols {
        return text.to_string();
    }
    if max_cols == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_cols - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
