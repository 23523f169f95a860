//! Per-widget background appearance

use crate::aps::OperatingMode;
use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Background alpha applied to new widgets
pub const DEFAULT_OPACITY: u8 = 25;

fn default_opacity() -> u8 {
    DEFAULT_OPACITY
}

/// Appearance settings of one widget instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetAppearance {
    /// Background alpha, 0-255
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    /// Always use a black background regardless of mode
    #[serde(default)]
    pub use_black: bool,
}

impl WidgetAppearance {
    /// Background color for the given operating mode
    pub fn background(&self, mode: OperatingMode) -> Color {
        let alpha = self.opacity;
        if self.use_black {
            return Color::from_rgba8(0, 0, 0, alpha);
        }
        match mode {
            OperatingMode::Client1 => Color::from_rgba8(0xE8, 0xC5, 0x0C, alpha),
            OperatingMode::Client2 => Color::from_rgba8(0x0F, 0xBB, 0xE0, alpha),
            OperatingMode::Aps | OperatingMode::PumpControl => Color::from_rgba8(0, 0, 0, alpha),
        }
    }
}

impl Default for WidgetAppearance {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            use_black: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_by_mode() {
        let appearance = WidgetAppearance {
            opacity: 128,
            use_black: false,
        };
        assert_eq!(appearance.background(OperatingMode::Aps).to_rgba8(), (0, 0, 0, 128));
        assert_eq!(
            appearance.background(OperatingMode::Client1).to_rgba8(),
            (0xE8, 0xC5, 0x0C, 128)
        );
        assert_eq!(
            appearance.background(OperatingMode::Client2).to_rgba8(),
            (0x0F, 0xBB, 0xE0, 128)
        );
    }

    #[test]
    fn test_use_black_overrides_client_tint() {
        let appearance = WidgetAppearance {
            opacity: 200,
            use_black: true,
        };
        assert_eq!(
            appearance.background(OperatingMode::Client2).to_rgba8(),
            (0, 0, 0, 200)
        );
    }
}
