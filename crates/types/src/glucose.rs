//! Glucose readings, units and trend classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit the user has chosen for displaying glucose values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GlucoseUnit {
    #[default]
    #[serde(rename = "mgdl")]
    Mgdl,
    #[serde(rename = "mmol")]
    Mmol,
}

impl GlucoseUnit {
    /// Label shown next to values in this unit
    pub fn label(&self) -> &'static str {
        match self {
            GlucoseUnit::Mgdl => "mg/dL",
            GlucoseUnit::Mmol => "mmol/L",
        }
    }
}

/// Direction of the glucose trend as classified by the trend calculator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendArrow {
    Up2,
    Up,
    Flat,
    Down,
    Down2,
    #[default]
    Unknown,
}

impl TrendArrow {
    /// Single glyph used by text renderers
    pub fn symbol(&self) -> &'static str {
        match self {
            TrendArrow::Up2 => "⇈",
            TrendArrow::Up => "↑",
            TrendArrow::Flat => "→",
            TrendArrow::Down => "↓",
            TrendArrow::Down2 => "⇊",
            TrendArrow::Unknown => "",
        }
    }
}

/// Most recent glucose reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BgReading {
    /// Recalculated value in mg/dL
    pub recalculated: f64,
    pub timestamp: DateTime<Utc>,
}

/// Low/high classification of the last reading, as supplied by the BG provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BgRange {
    Low,
    #[default]
    InRange,
    High,
}

/// Glucose deltas in mg/dL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GlucoseStatus {
    pub delta: f64,
    pub short_avg_delta: f64,
    pub long_avg_delta: f64,
}
