//! Touch controller model
//!
//! Typed view of the controller's telemetry, the parser that produces it and
//! the health rules applied to it.

mod error;
pub mod health;
pub mod parser;
mod types;

pub use error::ValidationError;
pub use health::{classify, HealthCategory};
pub use parser::{parse_line, parse_status, ResponseLine};
pub use types::{
    ElectrodeId, ElectrodeReading, ElectrodeThreshold, SensitivityLevel, TouchStatus,
    ELECTRODE_COUNT, MIN_THRESHOLD, SMALL_PAD_ELECTRODE,
};
