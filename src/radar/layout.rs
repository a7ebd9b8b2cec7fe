// Radar canvas layout
//
// Derives the radar's center and usable radius from the terminal area the
// radar is drawn into, and provides the geometry for the static decoration
// (range rings, sweep arm).

use std::f64::consts::{FRAC_PI_2, TAU};

/// Height of the virtual canvas; the width follows the terminal aspect ratio
const VIRTUAL_HEIGHT: f64 = 100.0;

/// Braille cells pack twice as many dots vertically, so one terminal row
/// spans roughly two columns' worth of width
const ROW_TO_COL_RATIO: f64 = 2.0;

/// Edge padding as a fraction of the half-span, leaves room for labels
const EDGE_PADDING_PERCENT: f64 = 0.10;

/// Minimum edge padding in canvas units
const MIN_EDGE_PADDING: f64 = 3.0;

/// Range rings drawn at these fractions of the max radius
pub const RING_FACTORS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// Center point and usable radius of the radar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarLayout {
    pub center_x: f64,
    pub center_y: f64,
    pub max_radius: f64,
}

impl Default for RadarLayout {
    /// Square 100×100 canvas with the minimum padding
    fn default() -> Self {
        let half = VIRTUAL_HEIGHT / 2.0;
        Self {
            center_x: half,
            center_y: half,
            max_radius: half - MIN_EDGE_PADDING,
        }
    }
}

/// Coordinate bounds handed to the ratatui canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            x: [0.0, VIRTUAL_HEIGHT],
            y: [0.0, VIRTUAL_HEIGHT],
        }
    }
}

impl RadarLayout {
    /// Convert a layout-space point (y grows downward, like screen space)
    /// into canvas space (y grows upward) by mirroring around the center
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        (x, 2.0 * self.center_y - y)
    }

    /// Points of a dotted range ring in canvas space
    pub fn ring_points(&self, factor: f64, step_degrees: usize) -> Vec<(f64, f64)> {
        let radius = self.max_radius * factor;
        (0..360)
            .step_by(step_degrees.max(1))
            .map(|deg| {
                let rad = (deg as f64).to_radians();
                (
                    self.center_x + radius * rad.cos(),
                    self.center_y + radius * rad.sin(),
                )
            })
            .collect()
    }

    /// Tip of the sweep arm for an animation phase in [0, 1)
    ///
    /// Phase 0 points straight up; the arm turns clockwise as the phase grows.
    pub fn sweep_tip(&self, phase: f32) -> (f64, f64) {
        let angle = FRAC_PI_2 - f64::from(phase).rem_euclid(1.0) * TAU;
        (
            self.center_x + self.max_radius * angle.cos(),
            self.center_y + self.max_radius * angle.sin(),
        )
    }
}

/// Calculate the radar layout for a terminal area
///
/// The canvas keeps a fixed virtual height of 100 units and widens or
/// narrows its x range so one unit covers the same physical distance on
/// both axes, which keeps the rings circular. The radius is bounded by the
/// shorter half-span minus edge padding.
///
/// Zero-sized areas fall back to the default square layout.
pub fn calculate_radar_layout(cols: u16, rows: u16) -> (RadarLayout, CanvasBounds) {
    if cols == 0 || rows == 0 {
        return (RadarLayout::default(), CanvasBounds::default());
    }

    let aspect = f64::from(cols) / (f64::from(rows) * ROW_TO_COL_RATIO);
    let half_height = VIRTUAL_HEIGHT / 2.0;
    let half_width = half_height * aspect;

    let center_x = half_height;
    let center_y = half_height;

    let half_span = half_width.min(half_height);
    let edge_padding = (half_span * EDGE_PADDING_PERCENT).max(MIN_EDGE_PADDING);
    let max_radius = (half_span - edge_padding).max(super::MIN_RADIUS);

    let layout = RadarLayout {
        center_x,
        center_y,
        max_radius,
    };
    let bounds = CanvasBounds {
        x: [center_x - half_width, center_x + half_width],
        y: [0.0, VIRTUAL_HEIGHT],
    };
    (layout, bounds)
}
