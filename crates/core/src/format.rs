//! Unit conversion and text formatting shared by the builder and displayers

use crate::constants::MGDL_TO_MMOLL;
use bg_widget_types::GlucoseUnit;
use chrono::{DateTime, Utc};

/// Convert a mg/dL value into `units`
pub fn from_mgdl_to_units(mgdl: f64, units: GlucoseUnit) -> f64 {
    match units {
        GlucoseUnit::Mgdl => mgdl,
        GlucoseUnit::Mmol => mgdl * MGDL_TO_MMOLL,
    }
}

/// Format a mg/dL value in `units` (no decimals for mg/dL, one for mmol/L)
pub fn from_mgdl_to_string_in_units(mgdl: f64, units: GlucoseUnit) -> String {
    let value = from_mgdl_to_units(mgdl, units);
    match units {
        GlucoseUnit::Mgdl => format!("{:.0}", value),
        GlucoseUnit::Mmol => format!("{:.1}", value),
    }
}

/// Like [`from_mgdl_to_string_in_units`] but always carries a sign
pub fn from_mgdl_to_signed_string_in_units(mgdl: f64, units: GlucoseUnit) -> String {
    let value = from_mgdl_to_units(mgdl, units);
    match units {
        GlucoseUnit::Mgdl => format!("{:+.0}", value),
        GlucoseUnit::Mmol => format!("{:+.1}", value),
    }
}

/// Target range text, e.g. `"100–120 mg/dL"` or `"80 mg/dL"` when low equals high
pub fn to_target_range_string(low_mgdl: f64, high_mgdl: f64, units: GlucoseUnit) -> String {
    let low = from_mgdl_to_string_in_units(low_mgdl, units);
    let high = from_mgdl_to_string_in_units(high_mgdl, units);
    if low == high {
        format!("{} {}", low, units.label())
    } else {
        format!("{}–{} {}", low, high, units.label())
    }
}

/// Whole minutes from `now` until `end`, rounded up, never negative
pub fn minutes_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (end - now).num_seconds().max(0);
    (seconds + 59) / 60
}

/// Whole minutes elapsed since `then`, never negative
pub fn minutes_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_minutes().max(0)
}

/// Short remaining-time text: `"30m"`, `"2h"`, `"1h 5m"`
pub fn remaining_string(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_units_string() {
        assert_eq!(from_mgdl_to_string_in_units(120.4, GlucoseUnit::Mgdl), "120");
        assert_eq!(from_mgdl_to_string_in_units(180.0, GlucoseUnit::Mmol), "10.0");
    }

    #[test]
    fn test_signed_string() {
        assert_eq!(from_mgdl_to_signed_string_in_units(3.0, GlucoseUnit::Mgdl), "+3");
        assert_eq!(from_mgdl_to_signed_string_in_units(-5.0, GlucoseUnit::Mgdl), "-5");
        assert_eq!(from_mgdl_to_signed_string_in_units(-18.0, GlucoseUnit::Mmol), "-1.0");
    }

    #[test]
    fn test_target_range_string() {
        assert_eq!(to_target_range_string(100.0, 120.0, GlucoseUnit::Mgdl), "100–120 mg/dL");
        assert_eq!(to_target_range_string(80.0, 80.0, GlucoseUnit::Mgdl), "80 mg/dL");
        assert_eq!(to_target_range_string(90.0, 108.0, GlucoseUnit::Mmol), "5.0–6.0 mmol/L");
    }

    #[test]
    fn test_minutes_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(minutes_until(now + Duration::minutes(30), now), 30);
        assert_eq!(minutes_until(now + Duration::seconds(61), now), 2);
        assert_eq!(minutes_until(now - Duration::minutes(5), now), 0);
    }

    #[test]
    fn test_remaining_string() {
        assert_eq!(remaining_string(30), "30m");
        assert_eq!(remaining_string(120), "2h");
        assert_eq!(remaining_string(65), "1h 5m");
        assert_eq!(remaining_string(0), "0m");
    }
}
