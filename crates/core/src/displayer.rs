//! Displayer trait (render sink)

use anyhow::Result;
use bg_widget_types::StatusSnapshot;

/// Trait for all displayers
///
/// Displayers receive finished snapshots and paint them on a widget
/// surface. They never read providers themselves.
pub trait Displayer: Send {
    /// Unique identifier for this displayer type
    fn id(&self) -> &str;

    /// Render a snapshot for one widget instance
    fn render(&mut self, widget_id: u32, snapshot: &StatusSnapshot) -> Result<()>;
}

/// Type-erased displayer for dynamic dispatch
pub type BoxedDisplayer = Box<dyn Displayer>;
