//! Serial Protocol Communication
//!
//! Implements the line-based text protocol of the touch controller firmware.
//!
//! Every command is a single line; the device answers with zero or more lines
//! of free text. There are no correlation identifiers, so only one command may
//! be outstanding at a time.

pub mod commands;
mod connection;
mod error;
pub mod serial;
mod transport;

pub use commands::Command;
pub use connection::{Connection, ConnectionConfig, TimingConfig};
pub use error::ProtocolError;
pub use serial::{list_ports, PortInfo, SerialTransport};
pub use transport::{split_lines, Transport};

/// Default baud rate for the touch controller
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default time to wait for a response to drain, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Read timeout of the underlying serial port while polling, in milliseconds
pub const READ_POLL_TIMEOUT_MS: u64 = 100;
