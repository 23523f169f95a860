//! bg-widget-sources: Provider implementations for the bg-widget status widget.

mod live;
mod state;

pub use live::LiveSource;
pub use state::{ProviderState, StateError};
