//! bg-widget: a glucose status widget for closed-loop diabetes management
//!
//! This library provides the core functionality for bg-widget, including:
//! - The snapshot builder that merges provider reads into one status snapshot
//! - The refresh scheduler that serializes refreshes onto a single worker
//! - Configuration management

pub mod config;
pub mod core;

// Re-export commonly used types
pub use crate::core::{RefreshHandle, RefreshScheduler, SnapshotBuilder};
pub use config::{AppConfig, OutputFormat, WidgetConfig};
pub use bg_widget_core::{Displayer, Providers};
pub use bg_widget_types::StatusSnapshot;
