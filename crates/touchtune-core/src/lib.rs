//! # TouchTune Core Library
//!
//! Core functionality for calibrating the capacitive touch wheel of the Izod Mini.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Line-based serial protocol communication with the touch controller
//! - Parsing of status telemetry into a typed model
//! - Electrode health classification
//! - Noise-based auto-tuning of per-electrode thresholds
//! - Saving configuration snapshots
//! - A simulated controller for demo mode and tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use touchtune_core::protocol::{Connection, ConnectionConfig};
//! use touchtune_core::touch::classify;
//!
//! let config = ConnectionConfig::new("/dev/ttyUSB0");
//! let mut conn = Connection::open(config)?;
//!
//! let status = conn.query_status()?;
//! for (id, reading) in &status.electrodes {
//!     println!("{}: {}", id, classify(reading));
//! }
//! ```

pub mod autotune;
pub mod demo;
pub mod protocol;
pub mod snapshot;
pub mod touch;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::autotune::{
        suggest_thresholds, AutoTuneOutcome, AutoTuneReport, AutoTuner, ThresholdSuggestion,
    };
    pub use crate::demo::SimulatedController;
    pub use crate::protocol::{
        Command, Connection, ConnectionConfig, ProtocolError, SerialTransport, TimingConfig,
        Transport,
    };
    pub use crate::snapshot::{save_config, ConfigSnapshot};
    pub use crate::touch::{
        classify, parse_status, ElectrodeId, ElectrodeReading, ElectrodeThreshold,
        HealthCategory, SensitivityLevel, TouchStatus, ValidationError,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
