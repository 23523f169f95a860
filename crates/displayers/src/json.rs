//! JSON-lines displayer

use anyhow::{Context, Result};
use bg_widget_core::Displayer;
use bg_widget_types::{StatusSnapshot, WidgetAppearance};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Serialize)]
struct WidgetFrame<'a> {
    widget_id: u32,
    background: String,
    snapshot: &'a StatusSnapshot,
}

/// Writes one JSON object per rendered snapshot
pub struct JsonDisplayer<W: Write + Send> {
    out: W,
    appearances: HashMap<u32, WidgetAppearance>,
}

impl<W: Write + Send> JsonDisplayer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            appearances: HashMap::new(),
        }
    }

    pub fn with_appearances(mut self, appearances: HashMap<u32, WidgetAppearance>) -> Self {
        self.appearances = appearances;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Displayer for JsonDisplayer<W> {
    fn id(&self) -> &str {
        "json"
    }

    fn render(&mut self, widget_id: u32, snapshot: &StatusSnapshot) -> Result<()> {
        let appearance = self.appearances.get(&widget_id).copied().unwrap_or_default();
        let frame = WidgetFrame {
            widget_id,
            background: appearance.background(snapshot.mode).to_argb_hex(),
            snapshot,
        };
        serde_json::to_writer(&mut self.out, &frame).context("Failed to serialize snapshot")?;
        writeln!(self.out).context("Failed to write snapshot")?;
        self.out.flush().context("Failed to flush snapshot")?;
        Ok(())
    }
}
