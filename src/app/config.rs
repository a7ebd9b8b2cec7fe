// Application configuration types
//
// This module contains configuration structs and constants for:
// - Refresh and rescan intervals
// - Radar visual settings
// - Animation timing

use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

/// Minimum refresh interval in milliseconds
pub const MIN_REFRESH_MS: u64 = 50;

/// Maximum refresh interval in milliseconds
pub const MAX_REFRESH_MS: u64 = 10000;

/// Refresh interval adjustment step in milliseconds
pub const REFRESH_STEP: u64 = 50;

/// Default refresh interval in milliseconds
pub const DEFAULT_REFRESH_MS: u64 = 500;

/// Data refresh multiplier (data refreshes at N times the UI interval)
pub const DATA_REFRESH_MULTIPLIER: u64 = 10;

/// Full rescans run every N data intervals for sources that need polling
pub const RESCAN_MULTIPLIER: u32 = 6;

/// Duration to highlight recently changed refresh intervals
pub const CHANGE_HIGHLIGHT_DURATION: Duration = Duration::from_millis(500);

/// Tick interval for radar animation (100ms)
pub const TICK_INTERVAL_MS: u128 = 100;

/// Pulse phase advance per tick; one pulse cycle every 2 seconds
pub const PULSE_STEP: f32 = 0.05;

/// Sweep phase advance per tick; one revolution every 4 seconds
pub const SWEEP_STEP: f32 = 0.025;

// ============================================================================
// Configuration Structs
// ============================================================================

/// Visual settings for the radar panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarSettings {
    /// Show text labels next to markers (toggle with 'l' key)
    pub labels_enabled: bool,

    /// Animate the rotating sweep arm (toggle with 'w' key)
    pub sweep_enabled: bool,

    /// Draw offline devices on the radar (toggle with 'o' key)
    pub show_offline: bool,
}

impl Default for RadarSettings {
    fn default() -> Self {
        Self {
            labels_enabled: true,
            sweep_enabled: true,
            show_offline: true,
        }
    }
}

/// Configuration for refresh intervals (unified)
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Refresh interval in milliseconds (50-10000ms)
    /// Data ticks use this * DATA_REFRESH_MULTIPLIER
    pub refresh_ms: u64,

    /// Timestamp of last interval change (for visual feedback)
    pub last_change: Option<Instant>,
}

impl RefreshConfig {
    /// Create a RefreshConfig with the given interval, clamped to the valid range
    pub fn new(refresh_ms: u64) -> Self {
        Self {
            refresh_ms: refresh_ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS),
            last_change: None,
        }
    }

    /// Get UI refresh interval as Duration
    pub fn ui_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Get data refresh interval as Duration (10x UI interval)
    pub fn data_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms * DATA_REFRESH_MULTIPLIER)
    }

    /// Interval between automatic full rescans
    pub fn rescan_interval(&self) -> Duration {
        self.data_interval() * RESCAN_MULTIPLIER
    }

    /// Whether the interval changed recently enough to be highlighted
    pub fn recently_changed(&self) -> bool {
        self.last_change
            .is_some_and(|t| t.elapsed() < CHANGE_HIGHLIGHT_DURATION)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_MS)
    }
}
