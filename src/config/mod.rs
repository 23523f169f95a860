//! Configuration management

mod settings;

pub use settings::{AppConfig, OutputFormat, WidgetConfig};
