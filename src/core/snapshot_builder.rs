//! Snapshot builder: derives a `StatusSnapshot` from one read of all providers
//!
//! Every field is derived independently. A provider read that fails is
//! logged and only the field depending on it falls back to its unavailable
//! state; the rest of the snapshot is still built.

use bg_widget_core::format::{
    from_mgdl_to_signed_string_in_units, from_mgdl_to_string_in_units, from_mgdl_to_units,
    minutes_since, minutes_until, remaining_string, to_target_range_string,
};
use bg_widget_core::{materially_different, Providers};
use bg_widget_types::{
    BasalDisplay, BasalIcon, BgDisplay, CobDisplay, CobInfo, Deltas, GlucoseUnit, IobDisplay,
    LoopRun, OperatingMode, ProfileDisplay, ProfileInfo, SensitivityDisplay, SensitivityIcon,
    Severity, StatusSnapshot, TargetDisplay, TargetKind, TrendArrow, VariableSensitivity,
};
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// Unwrap a provider read, logging failures
fn read<T>(what: &str, result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to read {}: {:#}", what, e);
            None
        }
    }
}

/// Builds status snapshots from a provider capability set
pub struct SnapshotBuilder {
    providers: Providers,
}

impl SnapshotBuilder {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Build a snapshot as of `now`
    pub fn build(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let units = read("glucose units", self.providers.profile.units()).unwrap_or_default();
        let mode = self.providers.status.operating_mode();
        let profile = read("profile", self.providers.profile.profile()).flatten();
        let last_run = read("last loop run", self.providers.loop_run.last_run()).flatten();
        let autosens_ratio =
            read("autosens ratio", self.providers.iob_cob.last_autosens_ratio()).flatten();

        StatusSnapshot {
            built_at: now,
            units,
            mode,
            bg: self.bg(units, now),
            deltas: self.deltas(units),
            temporary_basal: self.temporary_basal(now),
            extended_bolus: self.extended_bolus(now),
            iob: self.iob(),
            cob: self.cob(mode, last_run.as_ref()),
            temp_target: self.temp_target(units, now, profile.as_ref(), last_run.as_ref()),
            profile: self.profile(profile.as_ref()),
            sensitivity: self.sensitivity(autosens_ratio),
            variable_sensitivity: self.variable_sensitivity(
                units,
                mode,
                profile.as_ref(),
                last_run.as_ref(),
                autosens_ratio,
            ),
        }
    }

    fn bg(&self, units: GlucoseUnit, now: DateTime<Utc>) -> BgDisplay {
        let glucose = &self.providers.glucose;
        let range = read("bg range", glucose.bg_range()).unwrap_or_default();

        let Some(last_bg) = read("last bg", glucose.last_bg()).flatten() else {
            return BgDisplay {
                range,
                ..BgDisplay::default()
            };
        };

        BgDisplay {
            value: Some(from_mgdl_to_string_in_units(last_bg.recalculated, units)),
            trend: read("trend arrow", glucose.trend_arrow())
                .flatten()
                .unwrap_or(TrendArrow::Unknown),
            is_stale: !read("bg freshness", glucose.is_actual_bg()).unwrap_or(false),
            range,
            minutes_ago: Some(minutes_since(last_bg.timestamp, now)),
        }
    }

    fn deltas(&self, units: GlucoseUnit) -> Option<Deltas> {
        let status = read("glucose status", self.providers.glucose.glucose_status()).flatten()?;
        Some(Deltas {
            delta: from_mgdl_to_signed_string_in_units(status.delta, units),
            short_avg_delta: from_mgdl_to_signed_string_in_units(status.short_avg_delta, units),
            long_avg_delta: from_mgdl_to_signed_string_in_units(status.long_avg_delta, units),
        })
    }

    fn temporary_basal(&self, now: DateTime<Utc>) -> BasalDisplay {
        let basal = &self.providers.basal;
        let temp_basal = read("temp basal", basal.temp_basal_at(now)).flatten();
        let icon = match temp_basal {
            Some(tb) if tb.percent > 100 => BasalIcon::High,
            Some(tb) if tb.percent < 100 => BasalIcon::Low,
            _ => BasalIcon::NoTbr,
        };

        BasalDisplay {
            text: read("basal text", basal.basal_text()).flatten(),
            active: temp_basal.is_some(),
            icon,
        }
    }

    /// Hidden when the pump emulates extended boluses with temp basals,
    /// since the basal line already reports them
    fn extended_bolus(&self, now: DateTime<Utc>) -> Option<String> {
        let basal = &self.providers.basal;
        let extended = read("extended bolus", basal.extended_bolus_at(now)).flatten()?;
        let faking = read(
            "pump extended bolus capability",
            basal.is_faking_temps_by_extended_boluses(),
        )?;
        if faking {
            None
        } else {
            Some(extended.text)
        }
    }

    fn iob(&self) -> IobDisplay {
        let iob_cob = &self.providers.iob_cob;
        let bolus = read("bolus iob", iob_cob.bolus_iob()).unwrap_or(0.0);
        let basal = read("basal iob", iob_cob.basal_iob()).unwrap_or(0.0);
        IobDisplay {
            units: bolus + basal,
        }
    }

    fn cob(&self, mode: OperatingMode, last_run: Option<&LoopRun>) -> CobDisplay {
        let text = read("cob", self.providers.iob_cob.cob_info())
            .flatten()
            .and_then(|info| cob_text(&info));

        CobDisplay {
            text,
            carbs_required: self.carbs_required(mode, last_run),
        }
    }

    /// Carbs the last loop run asked for, unless carbs were logged since
    fn carbs_required(&self, mode: OperatingMode, last_run: Option<&LoopRun>) -> Option<u32> {
        if !mode.is_aps() {
            return None;
        }
        let last_run = last_run?;
        let carbs_req = last_run.constraints_processed?.carbs_req;
        if carbs_req == 0 {
            return None;
        }

        let newest_carbs = read("newest carbs", self.providers.carbs.newest_carbs())?;
        match newest_carbs {
            Some(entry) if entry.timestamp >= last_run.last_aps_run => None,
            _ => Some(carbs_req),
        }
    }

    fn temp_target(
        &self,
        units: GlucoseUnit,
        now: DateTime<Utc>,
        profile: Option<&ProfileInfo>,
        last_run: Option<&LoopRun>,
    ) -> Option<TargetDisplay> {
        let active = read(
            "temp target",
            self.providers.temp_target.temp_target_active_at(now),
        )?;

        if let Some(tt) = active {
            let remaining_minutes = minutes_until(tt.end, now);
            return Some(TargetDisplay {
                kind: TargetKind::Active { remaining_minutes },
                text: format!(
                    "{}, ends in {}",
                    to_target_range_string(tt.low_mgdl, tt.high_mgdl, units),
                    remaining_string(remaining_minutes)
                ),
            });
        }

        let profile = profile?;
        let target_used = last_run
            .and_then(|run| run.constraints_processed)
            .map(|cp| cp.target_bg)
            .unwrap_or(0.0);

        if target_used > 0.0 && materially_different(profile.target_mgdl(), target_used) {
            debug!(
                "Adjusted target. Profile: {} APS: {}",
                profile.target_mgdl(),
                target_used
            );
            Some(TargetDisplay {
                kind: TargetKind::AlgorithmAdjusted,
                text: to_target_range_string(target_used, target_used, units),
            })
        } else {
            Some(TargetDisplay {
                kind: TargetKind::Profile,
                text: to_target_range_string(
                    profile.target_low_mgdl,
                    profile.target_high_mgdl,
                    units,
                ),
            })
        }
    }

    fn profile(&self, profile: Option<&ProfileInfo>) -> ProfileDisplay {
        let severity = match profile {
            None => Severity::Critical,
            Some(p) if p.kind.is_modified() => Severity::Warning,
            Some(_) => Severity::Default,
        };

        ProfileDisplay {
            text: read(
                "profile name",
                self.providers.profile.profile_name_with_remaining_time(),
            )
            .flatten(),
            severity,
        }
    }

    fn sensitivity(&self, autosens_ratio: Option<f64>) -> SensitivityDisplay {
        let applied = read(
            "autosens mode",
            self.providers.status.is_autosens_enabled(),
        )
        .unwrap_or(false);
        let ratio_percent = autosens_ratio.map(|ratio| ratio * 100.0);

        let icon = match ratio_percent {
            Some(percent) if percent > 100.0 => SensitivityIcon::Above,
            Some(percent) if percent < 100.0 => SensitivityIcon::Below,
            _ => SensitivityIcon::Neutral,
        };

        SensitivityDisplay {
            ratio_percent,
            icon,
            applied,
        }
    }

    fn variable_sensitivity(
        &self,
        units: GlucoseUnit,
        mode: OperatingMode,
        profile: Option<&ProfileInfo>,
        last_run: Option<&LoopRun>,
        autosens_ratio: Option<f64>,
    ) -> Option<VariableSensitivity> {
        let isf = profile?.isf_mgdl;
        let request = last_run.and_then(|run| run.request);

        let variable_sens = match mode {
            OperatingMode::Aps => request.map(|r| r.variable_sens).unwrap_or(0.0),
            OperatingMode::Client1 | OperatingMode::Client2 => {
                read("remote aps result", self.providers.loop_run.remote_aps_result())
                    .flatten()
                    .map(|r| r.variable_sens)
                    .unwrap_or(0.0)
            }
            OperatingMode::PumpControl => 0.0,
        };

        if !materially_different(variable_sens, 0.0) || !materially_different(variable_sens, isf) {
            return None;
        }

        let ratio_used = request.map(|r| r.autosens_ratio).unwrap_or(1.0);
        let algorithm_ratio_percent = if materially_different(ratio_used, 1.0)
            && autosens_ratio.map_or(true, |own| materially_different(ratio_used, own))
        {
            Some(ratio_used * 100.0)
        } else {
            None
        };

        Some(VariableSensitivity {
            profile_isf: from_mgdl_to_units(isf, units),
            used_isf: from_mgdl_to_units(variable_sens, units),
            algorithm_ratio_percent,
        })
    }
}

/// COB text such as `"20 g"` or `"20 g (15)"` with future carbs
fn cob_text(info: &CobInfo) -> Option<String> {
    let cob = info.display_cob?;
    let mut text = format!("{:.0} g", cob);
    if info.future_carbs > 0.0 {
        text.push_str(&format!(" ({:.0})", info.future_carbs));
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use bg_widget_core::{
        AppStatus, BasalSource, CarbSource, GlucoseSource, IobCobSource, LoopSource,
        ProfileSource, TempTargetSource,
    };
    use bg_widget_sources::ProviderState;
    use bg_widget_types::{
        ApsResult, BgRange, BgReading, CarbEntry, ConstraintsProcessed, ExtendedBolusInfo,
        GlucoseStatus, IobTotals, ProfileKind, TempBasalInfo, TempTarget,
    };
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn profile(low: f64, high: f64) -> ProfileInfo {
        ProfileInfo {
            target_low_mgdl: low,
            target_high_mgdl: high,
            isf_mgdl: 50.0,
            kind: ProfileKind::Scheduled,
        }
    }

    fn run_with_target(target_bg: f64) -> LoopRun {
        LoopRun {
            last_aps_run: t(0),
            request: None,
            constraints_processed: Some(ConstraintsProcessed {
                target_bg,
                carbs_req: 0,
            }),
        }
    }

    fn builder(state: ProviderState) -> SnapshotBuilder {
        SnapshotBuilder::new(Providers::from_shared(Arc::new(state)))
    }

    /// Every read fails
    struct Unavailable;

    fn offline<T>() -> Result<T> {
        Err(anyhow!("provider offline"))
    }

    impl GlucoseSource for Unavailable {
        fn last_bg(&self) -> Result<Option<BgReading>> {
            offline()
        }

        fn bg_range(&self) -> Result<BgRange> {
            offline()
        }

        fn is_actual_bg(&self) -> Result<bool> {
            offline()
        }

        fn trend_arrow(&self) -> Result<Option<TrendArrow>> {
            offline()
        }

        fn glucose_status(&self) -> Result<Option<GlucoseStatus>> {
            offline()
        }
    }

    impl IobCobSource for Unavailable {
        fn bolus_iob(&self) -> Result<f64> {
            offline()
        }

        fn basal_iob(&self) -> Result<f64> {
            offline()
        }

        fn cob_info(&self) -> Result<Option<CobInfo>> {
            offline()
        }

        fn last_autosens_ratio(&self) -> Result<Option<f64>> {
            offline()
        }
    }

    impl LoopSource for Unavailable {
        fn last_run(&self) -> Result<Option<LoopRun>> {
            offline()
        }

        fn remote_aps_result(&self) -> Result<Option<ApsResult>> {
            offline()
        }
    }

    impl ProfileSource for Unavailable {
        fn units(&self) -> Result<GlucoseUnit> {
            offline()
        }

        fn profile(&self) -> Result<Option<ProfileInfo>> {
            offline()
        }

        fn profile_name_with_remaining_time(&self) -> Result<Option<String>> {
            offline()
        }
    }

    impl TempTargetSource for Unavailable {
        fn temp_target_active_at(&self, _now: DateTime<Utc>) -> Result<Option<TempTarget>> {
            offline()
        }
    }

    impl BasalSource for Unavailable {
        fn basal_text(&self) -> Result<Option<String>> {
            offline()
        }

        fn temp_basal_at(&self, _now: DateTime<Utc>) -> Result<Option<TempBasalInfo>> {
            offline()
        }

        fn extended_bolus_at(&self, _now: DateTime<Utc>) -> Result<Option<ExtendedBolusInfo>> {
            offline()
        }

        fn is_faking_temps_by_extended_boluses(&self) -> Result<bool> {
            offline()
        }
    }

    impl CarbSource for Unavailable {
        fn newest_carbs(&self) -> Result<Option<CarbEntry>> {
            offline()
        }
    }

    impl AppStatus for Unavailable {
        fn is_initialized(&self) -> bool {
            true
        }

        fn operating_mode(&self) -> OperatingMode {
            OperatingMode::Aps
        }

        fn is_autosens_enabled(&self) -> Result<bool> {
            offline()
        }
    }

    /// Only the bolus IOB read fails
    struct BolusIobFails(ProviderState);

    impl IobCobSource for BolusIobFails {
        fn bolus_iob(&self) -> Result<f64> {
            offline()
        }

        fn basal_iob(&self) -> Result<f64> {
            self.0.basal_iob()
        }

        fn cob_info(&self) -> Result<Option<CobInfo>> {
            self.0.cob_info()
        }

        fn last_autosens_ratio(&self) -> Result<Option<f64>> {
            self.0.last_autosens_ratio()
        }
    }

    /// Only the freshness read fails
    struct FreshnessUnknown(ProviderState);

    impl GlucoseSource for FreshnessUnknown {
        fn last_bg(&self) -> Result<Option<BgReading>> {
            self.0.last_bg()
        }

        fn bg_range(&self) -> Result<BgRange> {
            self.0.bg_range()
        }

        fn is_actual_bg(&self) -> Result<bool> {
            offline()
        }

        fn trend_arrow(&self) -> Result<Option<TrendArrow>> {
            self.0.trend_arrow()
        }

        fn glucose_status(&self) -> Result<Option<GlucoseStatus>> {
            self.0.glucose_status()
        }
    }

    /// A state where every field of the snapshot has something to show
    fn full_state() -> ProviderState {
        ProviderState {
            last_bg: Some(BgReading {
                recalculated: 142.0,
                timestamp: t(140),
            }),
            trend: Some(TrendArrow::Up),
            glucose_status: Some(GlucoseStatus {
                delta: 4.0,
                short_avg_delta: 3.0,
                long_avg_delta: 2.0,
            }),
            iob: IobTotals {
                bolus_iob: 1.0,
                basal_iob: 0.5,
            },
            autosens_ratio: Some(1.2),
            basal_text: Some("T: 1.20 U/h".to_string()),
            temp_basal: Some(TempBasalInfo { percent: 150 }),
            extended_bolus: Some(ExtendedBolusInfo {
                text: "1.00 U/h 30m".to_string(),
            }),
            profile_name: Some("Default".to_string()),
            temp_target: Some(TempTarget {
                low_mgdl: 140.0,
                high_mgdl: 140.0,
                end: t(200 + 30 * 60),
            }),
            ..variable_and_carbs_state()
        }
    }

    fn variable_and_carbs_state() -> ProviderState {
        let mut state = carbs_state(Some(50));
        state.profile = Some(profile(100.0, 120.0));
        if let Some(run) = state.last_run.as_mut() {
            run.request = Some(ApsResult {
                variable_sens: 42.0,
                autosens_ratio: 1.0,
            });
        }
        state
    }

    fn build_with(state: &ProviderState, swap: impl FnOnce(&mut Providers)) -> StatusSnapshot {
        let mut providers = Providers::from_shared(Arc::new(state.clone()));
        swap(&mut providers);
        SnapshotBuilder::new(providers).build(t(200))
    }

    #[test]
    fn test_absent_bg_is_unavailable_with_unknown_trend() {
        let snapshot = builder(ProviderState {
            trend: Some(TrendArrow::Up),
            ..Default::default()
        })
        .build(t(0));

        assert!(snapshot.bg.value.is_none());
        assert_eq!(snapshot.bg.trend, TrendArrow::Unknown);
        assert!(snapshot.bg.minutes_ago.is_none());
        assert!(snapshot.deltas.is_none());
    }

    #[test]
    fn test_bg_in_user_units() {
        let snapshot = builder(ProviderState {
            units: GlucoseUnit::Mmol,
            last_bg: Some(BgReading {
                recalculated: 180.0,
                timestamp: t(-300),
            }),
            bg_range: BgRange::High,
            bg_actual: false,
            trend: Some(TrendArrow::Down2),
            glucose_status: Some(GlucoseStatus {
                delta: -18.0,
                short_avg_delta: 0.0,
                long_avg_delta: 9.0,
            }),
            ..Default::default()
        })
        .build(t(0));

        assert_eq!(snapshot.bg.value.as_deref(), Some("10.0"));
        assert_eq!(snapshot.bg.trend, TrendArrow::Down2);
        assert!(snapshot.bg.is_stale);
        assert!(snapshot.bg.is_high());
        assert!(!snapshot.bg.is_low());
        assert_eq!(snapshot.bg.minutes_ago, Some(5));

        let deltas = snapshot.deltas.unwrap();
        assert_eq!(deltas.delta, "-1.0");
        assert_eq!(deltas.short_avg_delta, "+0.0");
        assert_eq!(deltas.long_avg_delta, "+0.5");
    }

    #[test]
    fn test_iob_is_exact_sum() {
        for (bolus, basal) in [(0.0, 0.0), (1.25, 0.35), (0.0, 2.1), (3.07, 0.0)] {
            let snapshot = builder(ProviderState {
                iob: IobTotals {
                    bolus_iob: bolus,
                    basal_iob: basal,
                },
                ..Default::default()
            })
            .build(t(0));
            assert_eq!(snapshot.iob.units, bolus + basal);
        }
    }

    #[test]
    fn test_active_temp_target_wins_over_loop_target() {
        let snapshot = builder(ProviderState {
            profile: Some(profile(100.0, 100.0)),
            temp_target: Some(TempTarget {
                low_mgdl: 100.0,
                high_mgdl: 120.0,
                end: t(30 * 60),
            }),
            last_run: Some(run_with_target(90.0)),
            ..Default::default()
        })
        .build(t(0));

        let target = snapshot.temp_target.unwrap();
        assert_eq!(
            target.kind,
            TargetKind::Active {
                remaining_minutes: 30
            }
        );
        assert_eq!(target.text, "100–120 mg/dL, ends in 30m");
        assert!(target.is_flagged());
    }

    #[test]
    fn test_loop_target_flagged_as_adjusted() {
        let snapshot = builder(ProviderState {
            profile: Some(profile(100.0, 100.0)),
            last_run: Some(run_with_target(80.0)),
            ..Default::default()
        })
        .build(t(0));

        let target = snapshot.temp_target.unwrap();
        assert_eq!(target.kind, TargetKind::AlgorithmAdjusted);
        assert_eq!(target.text, "80 mg/dL");
    }

    #[test]
    fn test_loop_target_within_epsilon_shows_profile() {
        let snapshot = builder(ProviderState {
            profile: Some(profile(90.0, 110.0)),
            last_run: Some(run_with_target(100.005)),
            ..Default::default()
        })
        .build(t(0));

        let target = snapshot.temp_target.unwrap();
        assert_eq!(target.kind, TargetKind::Profile);
        assert_eq!(target.text, "90–110 mg/dL");
        assert!(!target.is_flagged());
    }

    #[test]
    fn test_missing_loop_target_shows_profile() {
        let snapshot = builder(ProviderState {
            profile: Some(profile(100.0, 120.0)),
            last_run: Some(run_with_target(0.0)),
            ..Default::default()
        })
        .build(t(0));

        assert_eq!(snapshot.temp_target.unwrap().kind, TargetKind::Profile);
    }

    #[test]
    fn test_no_profile_no_temp_target() {
        let snapshot = builder(ProviderState::default()).build(t(0));
        assert!(snapshot.temp_target.is_none());
        assert_eq!(snapshot.profile.severity, Severity::Critical);
    }

    fn carbs_state(carbs_at: Option<i64>) -> ProviderState {
        ProviderState {
            cob: Some(CobInfo {
                display_cob: Some(20.0),
                future_carbs: 0.0,
            }),
            last_run: Some(LoopRun {
                last_aps_run: t(100),
                request: None,
                constraints_processed: Some(ConstraintsProcessed {
                    target_bg: 0.0,
                    carbs_req: 5,
                }),
            }),
            newest_carbs: carbs_at.map(|at| CarbEntry {
                amount: 15.0,
                timestamp: t(at),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_carbs_required_shown_when_no_newer_carbs() {
        let snapshot = builder(carbs_state(Some(50))).build(t(200));
        assert_eq!(snapshot.cob.carbs_required, Some(5));
        assert_eq!(snapshot.cob.text(), "20 g | 5 required");

        let snapshot = builder(carbs_state(None)).build(t(200));
        assert_eq!(snapshot.cob.carbs_required, Some(5));
    }

    #[test]
    fn test_carbs_required_suppressed_by_newer_carbs() {
        let snapshot = builder(carbs_state(Some(150))).build(t(200));
        assert_eq!(snapshot.cob.carbs_required, None);
        assert_eq!(snapshot.cob.text(), "20 g");
    }

    #[test]
    fn test_carbs_logged_at_last_run_suppress_carbs_required() {
        let snapshot = builder(carbs_state(Some(100))).build(t(200));
        assert_eq!(snapshot.cob.carbs_required, None);
    }

    #[test]
    fn test_carbs_required_only_in_aps_mode() {
        let snapshot = builder(ProviderState {
            mode: OperatingMode::Client1,
            ..carbs_state(Some(50))
        })
        .build(t(200));
        assert_eq!(snapshot.cob.carbs_required, None);
    }

    #[test]
    fn test_cob_text_with_future_carbs() {
        let info = CobInfo {
            display_cob: Some(20.4),
            future_carbs: 15.0,
        };
        assert_eq!(cob_text(&info).as_deref(), Some("20 g (15)"));
        assert_eq!(cob_text(&CobInfo::default()), None);
    }

    #[test]
    fn test_extended_bolus_suppressed_when_pump_fakes_it() {
        let state = ProviderState {
            extended_bolus: Some(ExtendedBolusInfo {
                text: "1.00 U/h 30m".to_string(),
            }),
            ..Default::default()
        };
        let snapshot = builder(state.clone()).build(t(0));
        assert_eq!(snapshot.extended_bolus.as_deref(), Some("1.00 U/h 30m"));

        let snapshot = builder(ProviderState {
            faking_temps_by_extended_boluses: true,
            ..state
        })
        .build(t(0));
        assert!(snapshot.extended_bolus.is_none());
    }

    #[test]
    fn test_temp_basal_icon() {
        for (percent, icon) in [
            (150, BasalIcon::High),
            (50, BasalIcon::Low),
            (0, BasalIcon::Low),
            (100, BasalIcon::NoTbr),
        ] {
            let snapshot = builder(ProviderState {
                basal_text: Some("T: 1.20 U/h".to_string()),
                temp_basal: Some(TempBasalInfo { percent }),
                ..Default::default()
            })
            .build(t(0));
            assert!(snapshot.temporary_basal.active);
            assert_eq!(snapshot.temporary_basal.icon, icon);
        }

        let snapshot = builder(ProviderState::default()).build(t(0));
        assert!(!snapshot.temporary_basal.active);
        assert_eq!(snapshot.temporary_basal.icon, BasalIcon::NoTbr);
    }

    #[test]
    fn test_profile_severity() {
        let modified = ProfileInfo {
            kind: ProfileKind::Effective {
                percentage: 80,
                timeshift: 0,
                duration: 60,
            },
            ..profile(100.0, 100.0)
        };
        let snapshot = builder(ProviderState {
            profile: Some(modified),
            profile_name: Some("Default (80%) (1h)".to_string()),
            ..Default::default()
        })
        .build(t(0));
        assert_eq!(snapshot.profile.severity, Severity::Warning);
        assert_eq!(snapshot.profile.text.as_deref(), Some("Default (80%) (1h)"));

        let snapshot = builder(ProviderState {
            profile: Some(profile(100.0, 100.0)),
            ..Default::default()
        })
        .build(t(0));
        assert_eq!(snapshot.profile.severity, Severity::Default);
    }

    #[test]
    fn test_sensitivity_icons() {
        let snapshot = builder(ProviderState {
            autosens_ratio: Some(1.2),
            ..Default::default()
        })
        .build(t(0));
        assert_eq!(snapshot.sensitivity.icon, SensitivityIcon::Above);
        assert!(snapshot.sensitivity.applied);
        assert_eq!(snapshot.sensitivity.text(), "120%");

        let snapshot = builder(ProviderState {
            autosens_ratio: Some(0.8),
            autosens_enabled: false,
            ..Default::default()
        })
        .build(t(0));
        assert_eq!(snapshot.sensitivity.icon, SensitivityIcon::Below);
        assert!(!snapshot.sensitivity.applied);
        assert_eq!(snapshot.sensitivity.text(), "80%");

        let snapshot = builder(ProviderState::default()).build(t(0));
        assert_eq!(snapshot.sensitivity.icon, SensitivityIcon::Neutral);
        assert!(snapshot.sensitivity.ratio_percent.is_none());
    }

    fn variable_state(variable_sens: f64, ratio: f64) -> ProviderState {
        ProviderState {
            profile: Some(profile(100.0, 100.0)),
            autosens_ratio: Some(1.0),
            last_run: Some(LoopRun {
                last_aps_run: t(0),
                request: Some(ApsResult {
                    variable_sens,
                    autosens_ratio: ratio,
                }),
                constraints_processed: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_variable_sensitivity_shown_when_isf_differs() {
        let snapshot = builder(variable_state(42.0, 1.2)).build(t(0));
        let vs = snapshot.variable_sensitivity.unwrap();
        assert_eq!(vs.profile_isf, 50.0);
        assert_eq!(vs.used_isf, 42.0);
        assert!((vs.algorithm_ratio_percent.unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_variable_sensitivity_ratio_hidden_when_equal_to_autosens() {
        let state = ProviderState {
            autosens_ratio: Some(1.2),
            ..variable_state(42.0, 1.2)
        };
        let vs = builder(state).build(t(0)).variable_sensitivity.unwrap();
        assert!(vs.algorithm_ratio_percent.is_none());

        let vs = builder(variable_state(42.0, 1.0))
            .build(t(0))
            .variable_sensitivity
            .unwrap();
        assert!(vs.algorithm_ratio_percent.is_none());
    }

    #[test]
    fn test_variable_sensitivity_hidden_when_trivial() {
        assert!(builder(variable_state(0.0, 1.2))
            .build(t(0))
            .variable_sensitivity
            .is_none());
        assert!(builder(variable_state(50.005, 1.2))
            .build(t(0))
            .variable_sensitivity
            .is_none());
    }

    #[test]
    fn test_variable_sensitivity_source_depends_on_mode() {
        let mut state = variable_state(0.0, 1.0);
        state.mode = OperatingMode::Client2;
        state.remote_aps_result = Some(ApsResult {
            variable_sens: 36.0,
            autosens_ratio: 1.0,
        });
        let vs = builder(state.clone()).build(t(0)).variable_sensitivity.unwrap();
        assert_eq!(vs.used_isf, 36.0);

        state.mode = OperatingMode::PumpControl;
        assert!(builder(state).build(t(0)).variable_sensitivity.is_none());
    }

    #[test]
    fn test_full_state_fills_every_field() {
        let snapshot = build_with(&full_state(), |_| {});
        assert_eq!(snapshot.bg.value.as_deref(), Some("142"));
        assert!(!snapshot.bg.is_stale);
        assert!(snapshot.deltas.is_some());
        assert!(snapshot.temporary_basal.active);
        assert!(snapshot.extended_bolus.is_some());
        assert_eq!(snapshot.iob.units, 1.5);
        assert_eq!(snapshot.cob.text(), "20 g | 5 required");
        assert_eq!(snapshot.temp_target.unwrap().text, "140 mg/dL, ends in 30m");
        assert_eq!(snapshot.profile.severity, Severity::Default);
        assert!(snapshot.sensitivity.applied);
        assert!(snapshot.variable_sensitivity.is_some());
    }

    #[test]
    fn test_failing_glucose_degrades_only_bg() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.glucose = Arc::new(Unavailable));

        assert!(snapshot.bg.value.is_none());
        assert_eq!(snapshot.bg.trend, TrendArrow::Unknown);
        assert!(snapshot.deltas.is_none());
        assert_eq!(snapshot.iob, baseline.iob);
        assert_eq!(snapshot.cob, baseline.cob);
        assert_eq!(snapshot.temp_target, baseline.temp_target);
        assert_eq!(snapshot.profile, baseline.profile);
    }

    #[test]
    fn test_unknown_freshness_marks_bg_stale() {
        let state = full_state();
        let snapshot = build_with(&state, |p| {
            p.glucose = Arc::new(FreshnessUnknown(state.clone()))
        });

        assert_eq!(snapshot.bg.value.as_deref(), Some("142"));
        assert!(snapshot.bg.is_stale);
    }

    #[test]
    fn test_failing_bolus_iob_contributes_zero() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| {
            p.iob_cob = Arc::new(BolusIobFails(state.clone()))
        });

        assert_eq!(snapshot.iob.units, 0.5);
        assert_eq!(snapshot.cob, baseline.cob);
        assert_eq!(snapshot.sensitivity, baseline.sensitivity);
    }

    #[test]
    fn test_failing_iob_cob_degrades_only_its_fields() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.iob_cob = Arc::new(Unavailable));

        assert_eq!(snapshot.iob.units, 0.0);
        assert!(snapshot.cob.text.is_none());
        assert_eq!(snapshot.cob.carbs_required, Some(5));
        assert!(snapshot.sensitivity.ratio_percent.is_none());
        assert_eq!(snapshot.sensitivity.icon, SensitivityIcon::Neutral);
        assert_eq!(snapshot.bg, baseline.bg);
        assert_eq!(snapshot.temp_target, baseline.temp_target);
        assert_eq!(snapshot.temporary_basal, baseline.temporary_basal);
    }

    #[test]
    fn test_failing_loop_hides_carbs_required_and_variable_sensitivity() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.loop_run = Arc::new(Unavailable));

        assert_eq!(snapshot.cob.carbs_required, None);
        assert_eq!(snapshot.cob.text, baseline.cob.text);
        assert!(snapshot.variable_sensitivity.is_none());
        assert_eq!(snapshot.temp_target, baseline.temp_target);
        assert_eq!(snapshot.iob, baseline.iob);
        assert_eq!(snapshot.sensitivity, baseline.sensitivity);
    }

    #[test]
    fn test_failing_loop_falls_back_to_profile_target() {
        let state = ProviderState {
            temp_target: None,
            ..full_state()
        };
        let snapshot = build_with(&state, |p| p.loop_run = Arc::new(Unavailable));

        let target = snapshot.temp_target.unwrap();
        assert_eq!(target.kind, TargetKind::Profile);
        assert_eq!(target.text, "100–120 mg/dL");
    }

    #[test]
    fn test_failing_profile_is_critical() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.profile = Arc::new(Unavailable));

        assert_eq!(snapshot.profile.severity, Severity::Critical);
        assert!(snapshot.profile.text.is_none());
        assert!(snapshot.variable_sensitivity.is_none());
        assert_eq!(snapshot.units, GlucoseUnit::Mgdl);
        assert_eq!(snapshot.temp_target, baseline.temp_target);
        assert_eq!(snapshot.bg, baseline.bg);
        assert_eq!(snapshot.cob, baseline.cob);
    }

    #[test]
    fn test_failing_temp_target_leaves_target_absent() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.temp_target = Arc::new(Unavailable));

        assert!(snapshot.temp_target.is_none());
        assert_eq!(snapshot.profile, baseline.profile);
        assert_eq!(snapshot.variable_sensitivity, baseline.variable_sensitivity);
    }

    #[test]
    fn test_failing_basal_degrades_only_basal_lines() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.basal = Arc::new(Unavailable));

        assert!(snapshot.temporary_basal.text.is_none());
        assert!(!snapshot.temporary_basal.active);
        assert_eq!(snapshot.temporary_basal.icon, BasalIcon::NoTbr);
        assert!(snapshot.extended_bolus.is_none());
        assert_eq!(snapshot.iob, baseline.iob);
        assert_eq!(snapshot.cob, baseline.cob);
    }

    #[test]
    fn test_failing_carbs_hides_carbs_required() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.carbs = Arc::new(Unavailable));

        assert_eq!(snapshot.cob.carbs_required, None);
        assert_eq!(snapshot.cob.text, baseline.cob.text);
        assert_eq!(snapshot.iob, baseline.iob);
    }

    #[test]
    fn test_failing_autosens_mode_is_not_applied() {
        let state = full_state();
        let baseline = build_with(&state, |_| {});
        let snapshot = build_with(&state, |p| p.status = Arc::new(Unavailable));

        assert!(!snapshot.sensitivity.applied);
        assert_eq!(snapshot.sensitivity.ratio_percent, baseline.sensitivity.ratio_percent);
        assert_eq!(snapshot.sensitivity.icon, SensitivityIcon::Above);
        assert_eq!(snapshot.cob, baseline.cob);
    }

    #[test]
    fn test_build_is_deterministic() {
        let state = ProviderState {
            last_bg: Some(BgReading {
                recalculated: 110.0,
                timestamp: t(-60),
            }),
            profile: Some(profile(100.0, 120.0)),
            temp_target: Some(TempTarget {
                low_mgdl: 140.0,
                high_mgdl: 140.0,
                end: t(0) + Duration::minutes(65),
            }),
            ..Default::default()
        };
        let builder = builder(state);
        let first = builder.build(t(0));
        assert_eq!(first, builder.build(t(0)));
        assert_eq!(first.temp_target.unwrap().text, "140 mg/dL, ends in 1h 5m");
    }
}
