//! Provider traits the snapshot builder reads from
//!
//! Every provider is an external collaborator that already computed its
//! values. Reads are synchronous, in-memory and must not block. A read may
//! fail; the builder then degrades only the field depending on it.

use anyhow::Result;
use bg_widget_types::{
    ApsResult, BgRange, BgReading, CarbEntry, CobInfo, ExtendedBolusInfo, GlucoseStatus,
    GlucoseUnit, LoopRun, OperatingMode, ProfileInfo, TempBasalInfo, TempTarget, TrendArrow,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Last glucose reading, trend and deltas
pub trait GlucoseSource: Send + Sync {
    /// Most recent reading, if any
    fn last_bg(&self) -> Result<Option<BgReading>>;

    /// Low/high classification of the last reading
    fn bg_range(&self) -> Result<BgRange>;

    /// False when the last reading is older than the freshness threshold
    fn is_actual_bg(&self) -> Result<bool>;

    /// Trend classification, None when not enough data
    fn trend_arrow(&self) -> Result<Option<TrendArrow>>;

    /// Deltas in mg/dL, None when trend data is unavailable
    fn glucose_status(&self) -> Result<Option<GlucoseStatus>>;
}

/// Insulin and carbs on board plus the autosens result
pub trait IobCobSource: Send + Sync {
    /// Rounded bolus IOB in units
    fn bolus_iob(&self) -> Result<f64>;

    /// Rounded basal IOB in units, including converted extended boluses
    fn basal_iob(&self) -> Result<f64>;

    fn cob_info(&self) -> Result<Option<CobInfo>>;

    /// Last computed autosens ratio (1.0 = 100%)
    fn last_autosens_ratio(&self) -> Result<Option<f64>>;
}

/// The dosing loop's last decision
pub trait LoopSource: Send + Sync {
    fn last_run(&self) -> Result<Option<LoopRun>>;

    /// Algorithm result received from the master device when running as a remote client
    fn remote_aps_result(&self) -> Result<Option<ApsResult>>;
}

/// Active profile
pub trait ProfileSource: Send + Sync {
    fn units(&self) -> Result<GlucoseUnit>;

    fn profile(&self) -> Result<Option<ProfileInfo>>;

    /// Profile name including its remaining time, as shown to the user
    fn profile_name_with_remaining_time(&self) -> Result<Option<String>>;
}

/// Explicitly set temporary targets
pub trait TempTargetSource: Send + Sync {
    fn temp_target_active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>>;
}

/// Temporary basals and extended boluses
pub trait BasalSource: Send + Sync {
    /// Basal line text (base rate or running temp basal)
    fn basal_text(&self) -> Result<Option<String>>;

    /// Temp basal running at `now`, including converted extended boluses
    fn temp_basal_at(&self, now: DateTime<Utc>) -> Result<Option<TempBasalInfo>>;

    fn extended_bolus_at(&self, now: DateTime<Utc>) -> Result<Option<ExtendedBolusInfo>>;

    /// The active pump emulates extended boluses with temp basals
    fn is_faking_temps_by_extended_boluses(&self) -> Result<bool>;
}

/// Logged carbohydrate entries
pub trait CarbSource: Send + Sync {
    fn newest_carbs(&self) -> Result<Option<CarbEntry>>;
}

/// Host application state and mode flags
pub trait AppStatus: Send + Sync {
    /// False until the host finished starting up
    fn is_initialized(&self) -> bool;

    fn operating_mode(&self) -> OperatingMode;

    /// Autosens is administratively enabled
    fn is_autosens_enabled(&self) -> Result<bool>;
}

/// Capability set passed to the snapshot builder
#[derive(Clone)]
pub struct Providers {
    pub glucose: Arc<dyn GlucoseSource>,
    pub iob_cob: Arc<dyn IobCobSource>,
    pub loop_run: Arc<dyn LoopSource>,
    pub profile: Arc<dyn ProfileSource>,
    pub temp_target: Arc<dyn TempTargetSource>,
    pub basal: Arc<dyn BasalSource>,
    pub carbs: Arc<dyn CarbSource>,
    pub status: Arc<dyn AppStatus>,
}

impl Providers {
    /// Use one object for every capability
    pub fn from_shared<T>(source: Arc<T>) -> Self
    where
        T: GlucoseSource
            + IobCobSource
            + LoopSource
            + ProfileSource
            + TempTargetSource
            + BasalSource
            + CarbSource
            + AppStatus
            + 'static,
    {
        Self {
            glucose: source.clone(),
            iob_cob: source.clone(),
            loop_run: source.clone(),
            profile: source.clone(),
            temp_target: source.clone(),
            basal: source.clone(),
            carbs: source.clone(),
            status: source,
        }
    }
}
