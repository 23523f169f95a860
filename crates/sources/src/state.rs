//! Provider state document
//!
//! A `ProviderState` is one coherent read of everything the widget needs,
//! serialized as JSON by whatever process owns the real calculators. It
//! implements every provider trait so it can be handed to the snapshot
//! builder directly.

use anyhow::Result;
use bg_widget_core::{
    AppStatus, BasalSource, CarbSource, GlucoseSource, IobCobSource, LoopSource, ProfileSource,
    TempTargetSource,
};
use bg_widget_types::{
    ApsResult, BgRange, BgReading, CarbEntry, CobInfo, ExtendedBolusInfo, GlucoseStatus,
    GlucoseUnit, IobTotals, LoopRun, OperatingMode, ProfileInfo, TempBasalInfo, TempTarget,
    TrendArrow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a provider state file
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read provider state {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse provider state {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn default_true() -> bool {
    true
}

/// Snapshot of all provider reads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderState {
    /// Host application finished starting up
    #[serde(default = "default_true")]
    pub initialized: bool,
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default = "default_true")]
    pub autosens_enabled: bool,
    #[serde(default)]
    pub units: GlucoseUnit,

    #[serde(default)]
    pub last_bg: Option<BgReading>,
    #[serde(default)]
    pub bg_range: BgRange,
    #[serde(default = "default_true")]
    pub bg_actual: bool,
    #[serde(default)]
    pub trend: Option<TrendArrow>,
    #[serde(default)]
    pub glucose_status: Option<GlucoseStatus>,

    #[serde(default)]
    pub iob: IobTotals,
    #[serde(default)]
    pub cob: Option<CobInfo>,
    #[serde(default)]
    pub autosens_ratio: Option<f64>,

    #[serde(default)]
    pub last_run: Option<LoopRun>,
    #[serde(default)]
    pub remote_aps_result: Option<ApsResult>,

    #[serde(default)]
    pub profile: Option<ProfileInfo>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub temp_target: Option<TempTarget>,

    #[serde(default)]
    pub basal_text: Option<String>,
    #[serde(default)]
    pub temp_basal: Option<TempBasalInfo>,
    #[serde(default)]
    pub extended_bolus: Option<ExtendedBolusInfo>,
    #[serde(default)]
    pub faking_temps_by_extended_boluses: bool,

    #[serde(default)]
    pub newest_carbs: Option<CarbEntry>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            initialized: true,
            mode: OperatingMode::default(),
            autosens_enabled: true,
            units: GlucoseUnit::default(),
            last_bg: None,
            bg_range: BgRange::default(),
            bg_actual: true,
            trend: None,
            glucose_status: None,
            iob: IobTotals::default(),
            cob: None,
            autosens_ratio: None,
            last_run: None,
            remote_aps_result: None,
            profile: None,
            profile_name: None,
            temp_target: None,
            basal_text: None,
            temp_basal: None,
            extended_bolus: None,
            faking_temps_by_extended_boluses: false,
            newest_carbs: None,
        }
    }
}

impl ProviderState {
    /// Load a state document from a JSON file
    pub fn load_from_path(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

impl GlucoseSource for ProviderState {
    fn last_bg(&self) -> Result<Option<BgReading>> {
        Ok(self.last_bg.clone())
    }

    fn bg_range(&self) -> Result<BgRange> {
        Ok(self.bg_range)
    }

    fn is_actual_bg(&self) -> Result<bool> {
        Ok(self.bg_actual)
    }

    fn trend_arrow(&self) -> Result<Option<TrendArrow>> {
        Ok(self.trend)
    }

    fn glucose_status(&self) -> Result<Option<GlucoseStatus>> {
        Ok(self.glucose_status)
    }
}

impl IobCobSource for ProviderState {
    fn bolus_iob(&self) -> Result<f64> {
        Ok(self.iob.bolus_iob)
    }

    fn basal_iob(&self) -> Result<f64> {
        Ok(self.iob.basal_iob)
    }

    fn cob_info(&self) -> Result<Option<CobInfo>> {
        Ok(self.cob)
    }

    fn last_autosens_ratio(&self) -> Result<Option<f64>> {
        Ok(self.autosens_ratio)
    }
}

impl LoopSource for ProviderState {
    fn last_run(&self) -> Result<Option<LoopRun>> {
        Ok(self.last_run.clone())
    }

    fn remote_aps_result(&self) -> Result<Option<ApsResult>> {
        Ok(self.remote_aps_result)
    }
}

impl ProfileSource for ProviderState {
    fn units(&self) -> Result<GlucoseUnit> {
        Ok(self.units)
    }

    fn profile(&self) -> Result<Option<ProfileInfo>> {
        Ok(self.profile.clone())
    }

    fn profile_name_with_remaining_time(&self) -> Result<Option<String>> {
        Ok(self.profile_name.clone())
    }
}

impl TempTargetSource for ProviderState {
    fn temp_target_active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>> {
        Ok(self.temp_target.clone().filter(|tt| tt.end > now))
    }
}

impl BasalSource for ProviderState {
    fn basal_text(&self) -> Result<Option<String>> {
        Ok(self.basal_text.clone())
    }

    fn temp_basal_at(&self, _now: DateTime<Utc>) -> Result<Option<TempBasalInfo>> {
        Ok(self.temp_basal)
    }

    fn extended_bolus_at(&self, _now: DateTime<Utc>) -> Result<Option<ExtendedBolusInfo>> {
        Ok(self.extended_bolus.clone())
    }

    fn is_faking_temps_by_extended_boluses(&self) -> Result<bool> {
        Ok(self.faking_temps_by_extended_boluses)
    }
}

impl CarbSource for ProviderState {
    fn newest_carbs(&self) -> Result<Option<CarbEntry>> {
        Ok(self.newest_carbs.clone())
    }
}

impl AppStatus for ProviderState {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    fn is_autosens_enabled(&self) -> Result<bool> {
        Ok(self.autosens_enabled)
    }
}
