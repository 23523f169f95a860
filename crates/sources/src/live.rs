//! Live provider backed by an atomically swapped state document

use crate::state::{ProviderState, StateError};
use anyhow::Result;
use arc_swap::ArcSwap;
use bg_widget_core::{
    AppStatus, BasalSource, CarbSource, GlucoseSource, IobCobSource, LoopSource, ProfileSource,
    TempTargetSource,
};
use bg_widget_types::{
    ApsResult, BgRange, BgReading, CarbEntry, CobInfo, ExtendedBolusInfo, GlucoseStatus,
    GlucoseUnit, LoopRun, OperatingMode, ProfileInfo, TempBasalInfo, TempTarget, TrendArrow,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Provider whose state is replaced wholesale when new data arrives.
///
/// Readers always see one complete `ProviderState`; a reload never exposes
/// a half-written document. Until the first state is stored the host is
/// reported as not initialized.
pub struct LiveSource {
    state: ArcSwap<ProviderState>,
    loaded: AtomicBool,
    last_modified: Mutex<Option<SystemTime>>,
}

impl LiveSource {
    /// Create an empty source that reports "not initialized"
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ProviderState::default()),
            loaded: AtomicBool::new(false),
            last_modified: Mutex::new(None),
        }
    }

    /// Create a source that already holds `state`
    pub fn with_state(state: ProviderState) -> Self {
        let source = Self::new();
        source.store(state);
        source
    }

    /// Replace the current state
    pub fn store(&self, state: ProviderState) {
        self.state.store(Arc::new(state));
        self.loaded.store(true, Ordering::Release);
    }

    /// Current state (cheap Arc clone)
    pub fn current(&self) -> Arc<ProviderState> {
        self.state.load_full()
    }

    /// Reload from `path` if its modification time changed.
    ///
    /// Returns `Ok(true)` when a new state was stored.
    pub fn reload_from_path(&self, path: &Path) -> Result<bool, StateError> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| StateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut last_modified = self.last_modified.lock().unwrap_or_else(|e| e.into_inner());
        if *last_modified == Some(modified) {
            debug!("Provider state {} unchanged", path.display());
            return Ok(false);
        }

        let state = ProviderState::load_from_path(path)?;
        self.store(state);
        *last_modified = Some(modified);
        info!("Loaded provider state from {}", path.display());
        Ok(true)
    }
}

impl Default for LiveSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GlucoseSource for LiveSource {
    fn last_bg(&self) -> Result<Option<BgReading>> {
        self.state.load().last_bg()
    }

    fn bg_range(&self) -> Result<BgRange> {
        self.state.load().bg_range()
    }

    fn is_actual_bg(&self) -> Result<bool> {
        self.state.load().is_actual_bg()
    }

    fn trend_arrow(&self) -> Result<Option<TrendArrow>> {
        self.state.load().trend_arrow()
    }

    fn glucose_status(&self) -> Result<Option<GlucoseStatus>> {
        self.state.load().glucose_status()
    }
}

impl IobCobSource for LiveSource {
    fn bolus_iob(&self) -> Result<f64> {
        self.state.load().bolus_iob()
    }

    fn basal_iob(&self) -> Result<f64> {
        self.state.load().basal_iob()
    }

    fn cob_info(&self) -> Result<Option<CobInfo>> {
        self.state.load().cob_info()
    }

    fn last_autosens_ratio(&self) -> Result<Option<f64>> {
        self.state.load().last_autosens_ratio()
    }
}

impl LoopSource for LiveSource {
    fn last_run(&self) -> Result<Option<LoopRun>> {
        self.state.load().last_run()
    }

    fn remote_aps_result(&self) -> Result<Option<ApsResult>> {
        self.state.load().remote_aps_result()
    }
}

impl ProfileSource for LiveSource {
    fn units(&self) -> Result<GlucoseUnit> {
        self.state.load().units()
    }

    fn profile(&self) -> Result<Option<ProfileInfo>> {
        self.state.load().profile()
    }

    fn profile_name_with_remaining_time(&self) -> Result<Option<String>> {
        self.state.load().profile_name_with_remaining_time()
    }
}

impl TempTargetSource for LiveSource {
    fn temp_target_active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>> {
        self.state.load().temp_target_active_at(now)
    }
}

impl BasalSource for LiveSource {
    fn basal_text(&self) -> Result<Option<String>> {
        self.state.load().basal_text()
    }

    fn temp_basal_at(&self, now: DateTime<Utc>) -> Result<Option<TempBasalInfo>> {
        self.state.load().temp_basal_at(now)
    }

    fn extended_bolus_at(&self, now: DateTime<Utc>) -> Result<Option<ExtendedBolusInfo>> {
        self.state.load().extended_bolus_at(now)
    }

    fn is_faking_temps_by_extended_boluses(&self) -> Result<bool> {
        self.state.load().is_faking_temps_by_extended_boluses()
    }
}

impl CarbSource for LiveSource {
    fn newest_carbs(&self) -> Result<Option<CarbEntry>> {
        self.state.load().newest_carbs()
    }
}

impl AppStatus for LiveSource {
    fn is_initialized(&self) -> bool {
        self.loaded.load(Ordering::Acquire) && self.state.load().is_initialized()
    }

    fn operating_mode(&self) -> OperatingMode {
        self.state.load().operating_mode()
    }

    fn is_autosens_enabled(&self) -> Result<bool> {
        self.state.load().is_autosens_enabled()
    }
}
