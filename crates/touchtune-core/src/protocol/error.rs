//! Protocol errors

use thiserror::Error;

use crate::touch::ValidationError;

/// Errors that can occur while talking to the touch controller
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("No response from device")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Device did not acknowledge '{0}'")]
    NotAcknowledged(String),

    #[error("Invalid value: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the session can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProtocolError::ConnectionFailed(_) => false,
            ProtocolError::IoError(e) => !matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected
            ),
            _ => true,
        }
    }
}
