//! Shared constants for the widget pipeline

use std::time::Duration;

/// Two glucose or ratio values closer than this are treated as equal
pub const MATERIAL_DIFFERENCE_EPSILON: f64 = 0.01;

/// Conversion factor from mg/dL to mmol/L
pub const MGDL_TO_MMOLL: f64 = 0.0555;

/// Default interval between timer-driven refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Returns true when `a` and `b` differ by more than [`MATERIAL_DIFFERENCE_EPSILON`]
pub fn materially_different(a: f64, b: f64) -> bool {
    (a - b).abs() > MATERIAL_DIFFERENCE_EPSILON
}
