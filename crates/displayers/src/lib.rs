//! bg-widget-displayers: Displayer implementations for the bg-widget status widget.

mod json;
mod text;

pub use json::JsonDisplayer;
pub use text::{render_lines, TextDisplayer};
