//! Active profile description

use serde::{Deserialize, Serialize};

/// How the active profile came to be
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileKind {
    /// Effective profile switch, possibly with modifications
    Effective {
        #[serde(default = "default_percentage")]
        percentage: i32,
        /// Hours
        #[serde(default)]
        timeshift: i64,
        /// Minutes, 0 for a permanent switch
        #[serde(default)]
        duration: i64,
    },
    /// Plain scheduled profile
    Scheduled,
}

fn default_percentage() -> i32 {
    100
}

impl ProfileKind {
    /// True when the profile is a temporarily modified variant
    pub fn is_modified(&self) -> bool {
        match *self {
            ProfileKind::Effective {
                percentage,
                timeshift,
                duration,
            } => percentage != 100 || timeshift != 0 || duration != 0,
            ProfileKind::Scheduled => false,
        }
    }
}

/// Profile values the widget needs, all glucose values in mg/dL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileInfo {
    pub target_low_mgdl: f64,
    pub target_high_mgdl: f64,
    pub isf_mgdl: f64,
    pub kind: ProfileKind,
}

impl ProfileInfo {
    /// Midpoint of the configured target range
    pub fn target_mgdl(&self) -> f64 {
        (self.target_low_mgdl + self.target_high_mgdl) / 2.0
    }
}
