// Radar positioning
//
// Maps a device identity and its class to a stable point on a disk.
// Angles come from a 32-bit string hash spread with the golden angle;
// distances come from a per-class zone factor plus a small jitter derived
// from the device's hardware address.
//
// Everything here is pure: no state, no I/O, same output for the same input.

pub mod layout;

pub use layout::RadarLayout;

use crate::device::{DeviceClass, NetworkDevice};
use std::f64::consts::{PI, TAU};

/// Golden angle in radians, π·(3 − √5)
pub const GOLDEN_ANGLE: f64 = 2.399963229728653;

/// Lower bound of the distance factor (fraction of max radius)
pub const MIN_DISTANCE_FACTOR: f64 = 0.15;

/// Upper bound of the distance factor (fraction of max radius)
pub const MAX_DISTANCE_FACTOR: f64 = 0.90;

/// Number of jitter steps derived from the secondary identity
const JITTER_STEPS: u32 = 20;

/// Smallest radius accepted; non-positive or non-finite radii are raised to this
pub const MIN_RADIUS: f64 = 1e-6;

/// Inputs for a single radar placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInput<'a> {
    /// Primary identity, drives the angle
    pub identity: &'a str,
    /// Secondary identity (hardware address), drives the radial jitter
    pub secondary_identity: &'a str,
    pub device_class: DeviceClass,
    pub center_x: f64,
    pub center_y: f64,
    pub max_radius: f64,
}

/// Computed placement in absolute coordinates plus polar form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarPosition {
    pub x: f64,
    pub y: f64,
    /// Angle in degrees, in [0, 360)
    pub angle_degrees: f64,
    /// Distance from the center, in [0.15, 0.90] × max radius
    pub distance: f64,
}

/// 32-bit rolling string hash over UTF-16 code units
///
/// `acc = acc * 31 + unit` with two's-complement wraparound at every step,
/// then the absolute value. The wraparound keeps the value bounded and is
/// what makes sequential identities land far apart.
pub fn string_hash(s: &str) -> u32 {
    let acc = s.encode_utf16().fold(0i32, |acc, unit| {
        (acc << 5).wrapping_sub(acc).wrapping_add(i32::from(unit))
    });
    acc.unsigned_abs()
}

/// Baseline distance factor for a device class
///
/// Routers sit near the hub; IoT and mobile devices drift to the rim.
pub const fn base_distance_factor(class: DeviceClass) -> f64 {
    match class {
        DeviceClass::Router => 0.08,
        DeviceClass::Server => 0.30,
        DeviceClass::Computer => 0.50,
        DeviceClass::Printer => 0.55,
        DeviceClass::Mobile => 0.65,
        DeviceClass::Iot => 0.75,
        DeviceClass::Unknown => 0.60,
    }
}

/// Baseline distance factor for a raw class label; unrecognized labels use `unknown`
pub fn base_distance_factor_for_label(label: &str) -> f64 {
    base_distance_factor(DeviceClass::from_label(label))
}

/// Radial jitter in [0.00, 0.19], in steps of 0.01
pub fn distance_variation(secondary_identity: &str) -> f64 {
    f64::from(string_hash(secondary_identity) % JITTER_STEPS) / 100.0
}

/// Angle in radians in [0, 2π) for a primary identity
pub fn identity_angle(identity: &str) -> f64 {
    (f64::from(string_hash(identity)) * GOLDEN_ANGLE).rem_euclid(TAU)
}

/// Clamped distance factor for a class and secondary identity
pub fn distance_factor(class: DeviceClass, secondary_identity: &str) -> f64 {
    (base_distance_factor(class) + distance_variation(secondary_identity))
        .clamp(MIN_DISTANCE_FACTOR, MAX_DISTANCE_FACTOR)
}

/// Place a device on the radar
///
/// Total: never fails. A radius that is not strictly positive (or not
/// finite) is raised to [`MIN_RADIUS`], which collapses the point onto the
/// center instead of mirroring it through it.
pub fn compute_position(input: &LayoutInput<'_>) -> RadarPosition {
    let max_radius = if input.max_radius.is_finite() && input.max_radius > 0.0 {
        input.max_radius
    } else {
        tracing::debug!(
            max_radius = input.max_radius,
            "Non-positive radar radius, clamping to minimum"
        );
        MIN_RADIUS
    };

    let angle = identity_angle(input.identity);
    let distance = max_radius * distance_factor(input.device_class, input.secondary_identity);

    let mut angle_degrees = angle * (180.0 / PI);
    if angle_degrees >= 360.0 {
        angle_degrees -= 360.0;
    }

    RadarPosition {
        x: input.center_x + angle.cos() * distance,
        y: input.center_y + angle.sin() * distance,
        angle_degrees,
        distance,
    }
}

/// Place a device record on a radar layout
///
/// Uses the device id as the primary identity and its MAC as the secondary.
pub fn device_position(device: &NetworkDevice, layout: &RadarLayout) -> RadarPosition {
    compute_position(&LayoutInput {
        identity: &device.id,
        secondary_identity: &device.mac,
        device_class: device.device_type,
        center_x: layout.center_x,
        center_y: layout.center_y,
        max_radius: layout.max_radius,
    })
}
