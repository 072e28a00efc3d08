//! Electrode health classification
//!
//! Rule-based scoring of a single electrode reading. The first rule that
//! matches wins, so a low baseline is reported as `Low` even if it is noisy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ElectrodeReading;

/// Baseline below this suggests a broken connection
pub const LOW_BASELINE: u32 = 50;

/// Baseline above this suggests a short circuit
pub const HIGH_BASELINE: u32 = 1000;

/// Maximum tolerated |baseline - filtered|
pub const NOISE_LIMIT: u32 = 100;

/// Delta above this means the pad is likely covered
pub const STUCK_DELTA: i32 = 200;

/// Health verdict for one electrode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthCategory {
    /// Normal operation
    Good,
    /// Baseline too low
    Low,
    /// Baseline too high
    High,
    /// Excessive noise
    Noisy,
    /// High delta while idle
    Stuck,
}

impl HealthCategory {
    /// Short upper-case label
    pub fn label(&self) -> &'static str {
        match self {
            HealthCategory::Good => "GOOD",
            HealthCategory::Low => "LOW",
            HealthCategory::High => "HIGH",
            HealthCategory::Noisy => "NOISY",
            HealthCategory::Stuck => "STUCK",
        }
    }

    /// What the verdict usually means on real hardware
    pub fn description(&self) -> &'static str {
        match self {
            HealthCategory::Good => "Normal operation",
            HealthCategory::Low => "Baseline too low (possible connection issue)",
            HealthCategory::High => "Baseline too high (possible short circuit)",
            HealthCategory::Noisy => "Excessive noise (interference or poor grounding)",
            HealthCategory::Stuck => "High delta (electrode may be stuck/covered)",
        }
    }

    /// Every category, in decision order with `Good` last
    pub fn all() -> [HealthCategory; 5] {
        [
            HealthCategory::Low,
            HealthCategory::High,
            HealthCategory::Noisy,
            HealthCategory::Stuck,
            HealthCategory::Good,
        ]
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a reading
pub fn classify(reading: &ElectrodeReading) -> HealthCategory {
    if reading.baseline < LOW_BASELINE {
        HealthCategory::Low
    } else if reading.baseline > HIGH_BASELINE {
        HealthCategory::High
    } else if reading.noise() > NOISE_LIMIT {
        HealthCategory::Noisy
    } else if reading.delta > STUCK_DELTA {
        HealthCategory::Stuck
    } else {
        HealthCategory::Good
    }
}
