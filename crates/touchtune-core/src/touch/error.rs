//! Validation errors for caller-supplied touch settings

use thiserror::Error;

/// A value supplied by the caller is outside the range the controller accepts.
///
/// These are always raised before anything is written to the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Sensitivity level must be between 1 and 5, got {0}")]
    SensitivityLevel(i64),

    #[error("Electrode must be between 0 and 11, got {0}")]
    ElectrodeId(i64),

    #[error("Touch threshold must be between 1 and 255, got {0}")]
    TouchThreshold(i64),

    #[error("Release threshold must be between 1 and 255, got {0}")]
    ReleaseThreshold(i64),

    #[error("Release threshold ({release}) must be less than touch threshold ({touch})")]
    ReleaseNotBelowTouch { touch: u8, release: u8 },
}
