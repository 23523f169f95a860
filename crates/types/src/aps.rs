//! Loop decision records and application operating modes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which flavour of the application is running
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Full closed loop on this device
    #[default]
    Aps,
    /// Remote follower, first client variant
    Client1,
    /// Remote follower, second client variant
    Client2,
    /// Pump control without automated dosing
    PumpControl,
}

impl OperatingMode {
    pub fn is_aps(&self) -> bool {
        matches!(self, OperatingMode::Aps)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, OperatingMode::Client1 | OperatingMode::Client2)
    }
}

/// Values the dosing algorithm used when it produced a result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ApsResult {
    /// Insulin sensitivity factor actually used, mg/dL per unit (0 when not variable)
    #[serde(default)]
    pub variable_sens: f64,
    /// Autosens ratio applied by the algorithm (1.0 = 100%)
    #[serde(default = "default_ratio")]
    pub autosens_ratio: f64,
}

fn default_ratio() -> f64 {
    1.0
}

impl Default for ApsResult {
    fn default() -> Self {
        Self {
            variable_sens: 0.0,
            autosens_ratio: default_ratio(),
        }
    }
}

/// Result after constraints were applied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ConstraintsProcessed {
    /// Target the loop aimed for, mg/dL (0 when unknown)
    #[serde(default)]
    pub target_bg: f64,
    /// Carbs the loop recommends eating, grams
    #[serde(default)]
    pub carbs_req: u32,
}

/// The loop's last decision record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopRun {
    pub last_aps_run: DateTime<Utc>,
    #[serde(default)]
    pub request: Option<ApsResult>,
    #[serde(default)]
    pub constraints_processed: Option<ConstraintsProcessed>,
}
