//! bg-widget-core: Core traits for the bg-widget status widget.
//!
//! This crate contains the provider traits the snapshot builder reads
//! from, the Displayer trait snapshots are rendered through, shared
//! constants and formatting helpers.

pub mod constants;
mod data_source;
mod displayer;
pub mod format;

pub use constants::{
    materially_different, DEFAULT_REFRESH_INTERVAL, MATERIAL_DIFFERENCE_EPSILON, MGDL_TO_MMOLL,
};
pub use data_source::{
    AppStatus, BasalSource, CarbSource, GlucoseSource, IobCobSource, LoopSource, ProfileSource,
    Providers, TempTargetSource,
};
pub use displayer::{BoxedDisplayer, Displayer};

// Re-export types used in trait signatures for convenience
pub use bg_widget_types::{StatusSnapshot, UNAVAILABLE};
