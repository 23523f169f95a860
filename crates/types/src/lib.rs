//! bg-widget-types: Shared data types for the bg-widget status widget.
//!
//! This crate contains pure data types (provider records, the status
//! snapshot, colors) that are shared across all bg-widget crates. It has
//! no rendering or threading dependencies.

pub mod aps;
pub mod appearance;
pub mod color;
pub mod glucose;
pub mod profile;
pub mod snapshot;
pub mod treatment;

// Re-export commonly used types at the crate root for convenience
pub use appearance::{WidgetAppearance, DEFAULT_OPACITY};
pub use aps::{ApsResult, ConstraintsProcessed, LoopRun, OperatingMode};
pub use color::Color;
pub use glucose::{BgRange, BgReading, GlucoseStatus, GlucoseUnit, TrendArrow};
pub use profile::{ProfileInfo, ProfileKind};
pub use snapshot::{
    BasalDisplay, BasalIcon, BgDisplay, CobDisplay, Deltas, IobDisplay, ProfileDisplay,
    SensitivityDisplay, SensitivityIcon, Severity, StatusSnapshot, TargetDisplay, TargetKind,
    VariableSensitivity, UNAVAILABLE,
};
pub use treatment::{CarbEntry, CobInfo, ExtendedBolusInfo, IobTotals, TempBasalInfo, TempTarget};
