//! Touch controller data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ValidationError;

/// Number of electrodes on the controller
pub const ELECTRODE_COUNT: u8 = 12;

/// Index of the smaller pad, which gets its own default thresholds
pub const SMALL_PAD_ELECTRODE: u8 = 11;

/// Lowest valid threshold value
pub const MIN_THRESHOLD: u8 = 1;

/// Identifier of one physical touch channel (0-11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub struct ElectrodeId(u8);

impl ElectrodeId {
    /// Validate and create an electrode id
    pub fn new(id: impl Into<i64>) -> Result<Self, ValidationError> {
        let id = id.into();
        if (0..ELECTRODE_COUNT as i64).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(ValidationError::ElectrodeId(id))
        }
    }

    /// Iterate over every electrode on the controller
    pub fn all() -> impl Iterator<Item = ElectrodeId> {
        (0..ELECTRODE_COUNT).map(ElectrodeId)
    }

    /// Raw channel index
    pub fn index(self) -> u8 {
        self.0
    }

    /// Whether this is the small pad
    pub fn is_small_pad(self) -> bool {
        self.0 == SMALL_PAD_ELECTRODE
    }
}

impl TryFrom<u8> for ElectrodeId {
    type Error = ValidationError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<ElectrodeId> for u8 {
    fn from(id: ElectrodeId) -> u8 {
        id.0
    }
}

impl fmt::Display for ElectrodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Global sensitivity level (1 = least sensitive, 5 = most sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub struct SensitivityLevel(u8);

impl SensitivityLevel {
    /// Least sensitive level
    pub const MIN: SensitivityLevel = SensitivityLevel(1);
    /// Most sensitive level
    pub const MAX: SensitivityLevel = SensitivityLevel(5);

    /// Validate and create a sensitivity level
    pub fn new(level: impl Into<i64>) -> Result<Self, ValidationError> {
        let level = level.into();
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(ValidationError::SensitivityLevel(level))
        }
    }

    /// Iterate over all levels, least sensitive first
    pub fn all() -> impl Iterator<Item = SensitivityLevel> {
        (Self::MIN.0..=Self::MAX.0).map(SensitivityLevel)
    }

    /// Numeric level
    pub fn value(self) -> u8 {
        self.0
    }

    /// Display name used by the firmware
    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "Very Low",
            2 => "Low",
            3 => "Medium",
            4 => "High",
            _ => "Very High",
        }
    }

    /// Firmware default thresholds applied to standard pads at this level
    pub fn default_thresholds(self) -> ElectrodeThreshold {
        let (touch, release) = match self.0 {
            1 => (15, 10),
            2 => (12, 8),
            3 => (8, 4),
            4 => (6, 3),
            _ => (4, 2),
        };
        ElectrodeThreshold { touch, release }
    }

    /// Firmware default thresholds for the small pad at this level
    pub fn small_pad_thresholds(self) -> ElectrodeThreshold {
        let (touch, release) = match self.0 {
            1 => (12, 8),
            2 => (10, 6),
            3 => (6, 3),
            4 => (4, 2),
            _ => (3, 1),
        };
        ElectrodeThreshold { touch, release }
    }

    /// Default thresholds the firmware uses for `electrode` at this level
    pub fn thresholds_for(self, electrode: ElectrodeId) -> ElectrodeThreshold {
        if electrode.is_small_pad() {
            self.small_pad_thresholds()
        } else {
            self.default_thresholds()
        }
    }
}

impl Default for SensitivityLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for SensitivityLevel {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<SensitivityLevel> for u8 {
    fn from(level: SensitivityLevel) -> u8 {
        level.0
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Touch/release threshold pair for one electrode.
///
/// Always satisfies `release < touch`, both in 1..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElectrodeThreshold {
    touch: u8,
    release: u8,
}

impl ElectrodeThreshold {
    /// Validate and create a threshold pair
    pub fn new(touch: impl Into<i64>, release: impl Into<i64>) -> Result<Self, ValidationError> {
        let touch = touch.into();
        let release = release.into();
        if !(MIN_THRESHOLD as i64..=u8::MAX as i64).contains(&touch) {
            return Err(ValidationError::TouchThreshold(touch));
        }
        if !(MIN_THRESHOLD as i64..=u8::MAX as i64).contains(&release) {
            return Err(ValidationError::ReleaseThreshold(release));
        }
        let (touch, release) = (touch as u8, release as u8);
        if release >= touch {
            return Err(ValidationError::ReleaseNotBelowTouch { touch, release });
        }
        Ok(Self { touch, release })
    }

    /// Touch threshold
    pub fn touch(&self) -> u8 {
        self.touch
    }

    /// Release threshold
    pub fn release(&self) -> u8 {
        self.release
    }
}

/// Telemetry for one electrode at query time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectrodeReading {
    /// Whether the channel is active
    pub enabled: bool,
    /// Long-term reference capacitance
    pub baseline: u32,
    /// Current smoothed capacitance
    pub filtered: u32,
    /// Deviation reported by the device
    pub delta: i32,
    /// Whether the device considers the pad touched
    pub touched: bool,
}

impl ElectrodeReading {
    /// Absolute difference between baseline and filtered value
    pub fn noise(&self) -> u32 {
        self.baseline.abs_diff(self.filtered)
    }
}

/// Parsed response to a status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchStatus {
    /// Global sensitivity level reported by the device
    pub sensitivity_level: SensitivityLevel,
    /// Only electrodes present in the response have an entry
    pub electrodes: BTreeMap<ElectrodeId, ElectrodeReading>,
}

impl TouchStatus {
    /// Reading for one electrode, if it was reported
    pub fn electrode(&self, id: ElectrodeId) -> Option<&ElectrodeReading> {
        self.electrodes.get(&id)
    }

    /// Enabled electrodes in ascending id order
    pub fn enabled_electrodes(&self) -> impl Iterator<Item = (ElectrodeId, &ElectrodeReading)> {
        self.electrodes
            .iter()
            .filter(|(_, reading)| reading.enabled)
            .map(|(id, reading)| (*id, reading))
    }
}
