//! The render-ready status snapshot handed to displayers.
//!
//! A snapshot is built from scratch on every refresh and is never mutated
//! afterwards. Optional fields that are `None` must be rendered with
//! [`UNAVAILABLE`], never with a value from an earlier refresh.

use crate::aps::OperatingMode;
use crate::glucose::{BgRange, GlucoseUnit, TrendArrow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical marker for a value that could not be read this cycle
pub const UNAVAILABLE: &str = "--";

/// Everything a widget shows, derived from one read of all providers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub built_at: DateTime<Utc>,
    pub units: GlucoseUnit,
    pub mode: OperatingMode,
    pub bg: BgDisplay,
    pub deltas: Option<Deltas>,
    pub temporary_basal: BasalDisplay,
    pub extended_bolus: Option<String>,
    pub iob: IobDisplay,
    pub cob: CobDisplay,
    pub temp_target: Option<TargetDisplay>,
    pub profile: ProfileDisplay,
    pub sensitivity: SensitivityDisplay,
    pub variable_sensitivity: Option<VariableSensitivity>,
}

/// Last glucose value and its classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BgDisplay {
    /// Value formatted in the user's units
    pub value: Option<String>,
    pub trend: TrendArrow,
    /// Last reading is older than the provider's freshness threshold
    pub is_stale: bool,
    pub range: BgRange,
    /// Minutes since the last reading
    pub minutes_ago: Option<i64>,
}

impl BgDisplay {
    pub fn is_low(&self) -> bool {
        self.range == BgRange::Low
    }

    pub fn is_high(&self) -> bool {
        self.range == BgRange::High
    }
}

/// Glucose change in the user's units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deltas {
    pub delta: String,
    pub short_avg_delta: String,
    pub long_avg_delta: String,
}

/// Icon variant for the basal line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BasalIcon {
    #[default]
    NoTbr,
    High,
    Low,
}

/// Basal rate line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BasalDisplay {
    pub text: Option<String>,
    /// A temp basal (or converted extended bolus) is running
    pub active: bool,
    pub icon: BasalIcon,
}

/// Insulin on board, always present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IobDisplay {
    pub units: f64,
}

impl IobDisplay {
    pub fn text(&self) -> String {
        format!("{:.2} U", self.units)
    }
}

/// Carbs on board with the optional carbs-required hint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CobDisplay {
    pub text: Option<String>,
    pub carbs_required: Option<u32>,
}

impl CobDisplay {
    /// Full COB line, e.g. `"12 g | 5 required"`
    pub fn text(&self) -> String {
        let mut text = self.text.clone().unwrap_or_else(|| UNAVAILABLE.to_string());
        if let Some(required) = self.carbs_required {
            text.push_str(&format!(" | {} required", required));
        }
        text
    }
}

/// Where the displayed target comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TargetKind {
    /// An explicitly set temporary target
    Active { remaining_minutes: i64 },
    /// The loop used a target different from the profile
    AlgorithmAdjusted,
    /// The profile's configured range
    Profile,
}

/// Target line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetDisplay {
    pub kind: TargetKind,
    pub text: String,
}

impl TargetDisplay {
    /// Shown with warning styling
    pub fn is_flagged(&self) -> bool {
        !matches!(self.kind, TargetKind::Profile)
    }
}

/// Severity used when styling the profile line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Default,
    Warning,
    Critical,
}

/// Active profile line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileDisplay {
    pub text: Option<String>,
    pub severity: Severity,
}

/// Direction of the autosens adjustment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityIcon {
    Above,
    Below,
    #[default]
    Neutral,
}

/// Autosens overlay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SensitivityDisplay {
    /// Last computed ratio as a percentage
    pub ratio_percent: Option<f64>,
    pub icon: SensitivityIcon,
    /// False when autosens is disabled and the ratio is informational only
    pub applied: bool,
}

impl SensitivityDisplay {
    pub fn text(&self) -> String {
        match self.ratio_percent {
            Some(ratio) => format!("{:.0}%", ratio),
            None => UNAVAILABLE.to_string(),
        }
    }
}

/// Variable sensitivity overlay, in the user's units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableSensitivity {
    pub profile_isf: f64,
    pub used_isf: f64,
    /// Ratio the algorithm applied when it differs from autosens's own ratio
    pub algorithm_ratio_percent: Option<f64>,
}

impl VariableSensitivity {
    /// Lines as shown on the widget, e.g. `["Alg: 120%", "50.0→42.0"]`
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        if let Some(ratio) = self.algorithm_ratio_percent {
            lines.push(format!("Alg: {:.0}%", ratio));
        }
        lines.push(format!("{:.1}→{:.1}", self.profile_isf, self.used_isf));
        lines
    }
}
