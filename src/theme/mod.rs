// Theme module - Color constants and theme re-exports
//
// Palette for the radar dashboard: a dark scope with cyan phosphor for the
// instrument itself and traffic-light colors for device status.

pub mod status;

use ratatui::style::Color;

/// Phosphor cyan - radar rings, sweep arm, borders, titles
/// RGB: (0, 245, 255)
pub const RADAR_CYAN: Color = Color::Rgb(0, 245, 255);

/// Dimmed cyan - grid lines, crosshair, inactive decoration
/// RGB: (0, 110, 120)
pub const GRID_CYAN: Color = Color::Rgb(0, 110, 120);

/// Neutral text - general labels, list rows
/// RGB: (169, 177, 214)
pub const TEXT_MUTED: Color = Color::Rgb(169, 177, 214);

/// Highlight - selection markers, active sort field
/// RGB: (187, 154, 247)
pub const ACCENT_VIOLET: Color = Color::Rgb(187, 154, 247);

/// Row background of the selected device
/// RGB: (22, 40, 64)
pub const SELECTION_BG: Color = Color::Rgb(22, 40, 64);

pub use status::{
    status_color, status_color_for_label, status_hex, status_hex_for_label, OFFLINE_RED,
    ONLINE_GREEN, UNKNOWN_AMBER,
};

/// Interpolate between two RGB colors based on a ratio (0.0 ~ 1.0)
pub fn interpolate_color(color1: (u8, u8, u8), color2: (u8, u8, u8), ratio: f32) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    let r = (color1.0 as f32 + (color2.0 as f32 - color1.0 as f32) * ratio) as u8;
    let g = (color1.1 as f32 + (color2.1 as f32 - color1.1 as f32) * ratio) as u8;
    let b = (color1.2 as f32 + (color2.2 as f32 - color1.2 as f32) * ratio) as u8;
    Color::Rgb(r, g, b)
}

/// Scale an RGB color toward black; non-RGB colors are returned unchanged
pub fn dim(color: Color, factor: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => interpolate_color((0, 0, 0), (r, g, b), factor),
        other => other,
    }
}

/// Get color for refresh interval based on its value relative to default
///
/// Faster than default shifts toward amber, then red, as a hint that the
/// scanner is being polled hard. A recent change is shown brighter.
pub fn get_refresh_color(interval_ms: u64, default_ms: u64, recently_changed: bool) -> Color {
    let base_color = if interval_ms < default_ms {
        let ratio = (default_ms - interval_ms) as f32 / default_ms as f32;
        if ratio > 0.5 {
            OFFLINE_RED
        } else {
            UNKNOWN_AMBER
        }
    } else {
        ONLINE_GREEN
    };

    if !recently_changed {
        return base_color;
    }

    match base_color {
        Color::Rgb(r, g, b) => Color::Rgb(
            ((r as f32 * 1.2).min(255.0)) as u8,
            ((g as f32 * 1.2).min(255.0)) as u8,
            ((b as f32 * 1.2).min(255.0)) as u8,
        ),
        _ => base_color,
    }
}
