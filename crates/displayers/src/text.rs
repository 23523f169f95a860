//! Plain-text displayer
//!
//! Writes each snapshot as a block of labelled lines. Useful on a terminal
//! and as the reference rendering in tests.

use anyhow::{Context, Result};
use bg_widget_core::Displayer;
use bg_widget_types::{
    BasalIcon, SensitivityIcon, Severity, StatusSnapshot, WidgetAppearance, UNAVAILABLE,
};
use std::collections::HashMap;
use std::io::Write;

/// Renders snapshots as human readable text
pub struct TextDisplayer<W: Write + Send> {
    out: W,
    appearances: HashMap<u32, WidgetAppearance>,
}

impl<W: Write + Send> TextDisplayer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            appearances: HashMap::new(),
        }
    }

    /// Use per-widget appearance settings for the background line
    pub fn with_appearances(mut self, appearances: HashMap<u32, WidgetAppearance>) -> Self {
        self.appearances = appearances;
        self
    }

    /// Consume the displayer and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Format one snapshot as lines
pub fn render_lines(
    widget_id: u32,
    snapshot: &StatusSnapshot,
    appearance: &WidgetAppearance,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(12);

    lines.push(format!(
        "[widget {}] background {}",
        widget_id,
        appearance.background(snapshot.mode).to_argb_hex()
    ));

    let bg = &snapshot.bg;
    let mut bg_line = match &bg.value {
        // Strike-through is not available on a terminal, mark stale values instead
        Some(value) if bg.is_stale => format!("BG       ~{}~", value),
        Some(value) => format!("BG       {}", value),
        None => format!("BG       {}", UNAVAILABLE),
    };
    let arrow = bg.trend.symbol();
    if !arrow.is_empty() {
        bg_line.push(' ');
        bg_line.push_str(arrow);
    }
    if bg.is_low() {
        bg_line.push_str(" LOW");
    } else if bg.is_high() {
        bg_line.push_str(" HIGH");
    }
    if let Some(minutes) = bg.minutes_ago {
        bg_line.push_str(&format!(" ({} min ago)", minutes));
    }
    lines.push(bg_line);

    lines.push(match &snapshot.deltas {
        Some(d) => format!(
            "Delta    {} / {} / {}",
            d.delta, d.short_avg_delta, d.long_avg_delta
        ),
        None => format!("Delta    {0} / {0} / {0}", UNAVAILABLE),
    });

    let basal = &snapshot.temporary_basal;
    let basal_marker = match basal.icon {
        BasalIcon::NoTbr => "",
        BasalIcon::High => " ▲",
        BasalIcon::Low => " ▼",
    };
    lines.push(format!(
        "Basal    {}{}{}",
        basal.text.as_deref().unwrap_or(UNAVAILABLE),
        basal_marker,
        if basal.active { " (temp)" } else { "" }
    ));

    if let Some(extended) = &snapshot.extended_bolus {
        lines.push(format!("Extended {}", extended));
    }

    lines.push(format!("IOB      {}", snapshot.iob.text()));
    lines.push(format!("COB      {}", snapshot.cob.text()));

    lines.push(match &snapshot.temp_target {
        Some(target) if target.is_flagged() => format!("Target   {} !", target.text),
        Some(target) => format!("Target   {}", target.text),
        None => format!("Target   {}", UNAVAILABLE),
    });

    let profile = &snapshot.profile;
    lines.push(format!(
        "Profile  {}{}",
        profile.text.as_deref().unwrap_or(UNAVAILABLE),
        match profile.severity {
            Severity::Default => "",
            Severity::Warning => " !",
            Severity::Critical => " !!",
        }
    ));

    let sens = &snapshot.sensitivity;
    let sens_icon = match sens.icon {
        SensitivityIcon::Above => "▲",
        SensitivityIcon::Below => "▼",
        SensitivityIcon::Neutral => "↕",
    };
    lines.push(format!(
        "Sens     {} {}{}",
        sens_icon,
        sens.text(),
        if sens.applied { "" } else { " (off)" }
    ));

    if let Some(variable) = &snapshot.variable_sensitivity {
        lines.push(format!("VarSens  {}", variable.lines().join(" / ")));
    }

    lines
}

impl<W: Write + Send> Displayer for TextDisplayer<W> {
    fn id(&self) -> &str {
        "text"
    }

    fn render(&mut self, widget_id: u32, snapshot: &StatusSnapshot) -> Result<()> {
        let appearance = self.appearances.get(&widget_id).copied().unwrap_or_default();
        for line in render_lines(widget_id, snapshot, &appearance) {
            writeln!(self.out, "{}", line).context("Failed to write widget text")?;
        }
        writeln!(self.out).context("Failed to write widget text")?;
        self.out.flush().context("Failed to flush widget text")?;
        Ok(())
    }
}
