// Device status colors
//
// Fixed status → color table. Anything that is not a recognized status
// label gets the "unknown" color.

use crate::device::DeviceStatus;
use ratatui::style::Color;

/// Online devices - #00ff88
pub const ONLINE_GREEN: Color = Color::Rgb(0, 255, 136);

/// Offline devices - #ff4757
pub const OFFLINE_RED: Color = Color::Rgb(255, 71, 87);

/// Unknown status and fallback - #ffa502
pub const UNKNOWN_AMBER: Color = Color::Rgb(255, 165, 2);

/// Terminal color for a device status
pub const fn status_color(status: DeviceStatus) -> Color {
    match status {
        DeviceStatus::Online => ONLINE_GREEN,
        DeviceStatus::Offline => OFFLINE_RED,
        DeviceStatus::Unknown => UNKNOWN_AMBER,
    }
}

/// Hex color string for a device status
pub const fn status_hex(status: DeviceStatus) -> &'static str {
    match status {
        DeviceStatus::Online => "#00ff88",
        DeviceStatus::Offline => "#ff4757",
        DeviceStatus::Unknown => "#ffa502",
    }
}

/// Terminal color for a raw status label; unrecognized labels use the unknown color
pub fn status_color_for_label(label: &str) -> Color {
    status_color(DeviceStatus::from_label(label))
}

/// Hex color for a raw status label; unrecognized labels use the unknown color
pub fn status_hex_for_label(label: &str) -> &'static str {
    status_hex(DeviceStatus::from_label(label))
}

/// Short status glyph for list rows
pub const fn status_icon(status: DeviceStatus) -> &'static str {
    match status {
        DeviceStatus::Online => "●",
        DeviceStatus::Offline => "○",
        DeviceStatus::Unknown => "◌",
    }
}
