//! Byte-level link abstraction
//!
//! A [`Transport`] moves raw bytes to the controller and collects whatever
//! lines it sends back. The real implementation wraps a serial port; the
//! simulated controller in [`crate::demo`] implements the same trait.

use std::time::Duration;

use super::ProtocolError;

/// Line-oriented link to the touch controller
pub trait Transport {
    /// Write raw bytes to the device
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError>;

    /// Collect every line the device has buffered, waiting at most `timeout`
    /// for the first byte. Returns an empty vector if nothing arrives in time.
    fn drain_lines(&mut self, timeout: Duration) -> Result<Vec<String>, ProtocolError>;

    /// Discard any pending input
    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        (**self).write(bytes)
    }

    fn drain_lines(&mut self, timeout: Duration) -> Result<Vec<String>, ProtocolError> {
        (**self).drain_lines(timeout)
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        (**self).clear_input()
    }
}

/// Split received bytes into trimmed, non-empty lines
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
