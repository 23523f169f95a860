//! Insulin, carbohydrate and temporary-target records read from the providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Insulin on board split into its bolus and basal parts.
///
/// Both parts are already rounded by the IOB calculator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct IobTotals {
    pub bolus_iob: f64,
    /// Includes the contribution of extended boluses converted to temp basals
    pub basal_iob: f64,
}

/// Carbohydrates on board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CobInfo {
    /// Grams still absorbing, None when COB could not be calculated
    pub display_cob: Option<f64>,
    /// Grams entered for the future and not yet started
    #[serde(default)]
    pub future_carbs: f64,
}

/// Temporary basal currently running (including converted extended boluses)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempBasalInfo {
    /// Rate as a percentage of the profile basal
    pub percent: i32,
}

/// Extended bolus currently running
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtendedBolusInfo {
    pub text: String,
}

/// An explicitly set temporary target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TempTarget {
    pub low_mgdl: f64,
    pub high_mgdl: f64,
    pub end: DateTime<Utc>,
}

/// Logged carbohydrate entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarbEntry {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}
