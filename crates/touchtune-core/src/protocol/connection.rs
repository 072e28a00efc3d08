//! Connection management
//!
//! Handles the session lifecycle and command execution with the controller.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{
    Command, ProtocolError, SerialTransport, Transport, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
use crate::touch::{parse_status, ElectrodeId, ElectrodeThreshold, SensitivityLevel, TouchStatus};

/// Protocol timing, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after opening the port; the board resets on connect
    pub open_settle_ms: u64,
    /// Wait between writing a command and draining its response
    pub response_settle_ms: u64,
    /// Wait after an acknowledged calibration
    pub calibration_settle_ms: u64,
    /// Wait after an acknowledged calibration started by auto-tune
    pub autotune_settle_ms: u64,
    /// Wait after an acknowledged reset
    pub reset_settle_ms: u64,
    /// Maximum time to wait for response data
    pub drain_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            open_settle_ms: 2000,
            response_settle_ms: 100,
            calibration_settle_ms: 2000,
            autotune_settle_ms: 3000,
            reset_settle_ms: 1000,
            drain_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl TimingConfig {
    /// No waiting at all; for in-process transports
    pub fn immediate() -> Self {
        Self {
            open_settle_ms: 0,
            response_settle_ms: 0,
            calibration_settle_ms: 0,
            autotune_settle_ms: 0,
            reset_settle_ms: 0,
            drain_timeout_ms: 0,
        }
    }

    /// Extra wait after `command` has been acknowledged
    pub fn settle_after(&self, command: &Command) -> Duration {
        let ms = match command {
            Command::ForceCalibration => self.calibration_settle_ms,
            Command::Reset => self.reset_settle_ms,
            _ => 0,
        };
        Duration::from_millis(ms)
    }
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Protocol timing
    pub timing: TimingConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timing: TimingConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Default configuration for `port_name`
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Override the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

fn settle(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// An open session with the touch controller.
///
/// Owns the transport exclusively; every operation takes `&mut self`, so a
/// command is always fully drained before the next one is written.
pub struct Connection<T: Transport = SerialTransport> {
    transport: T,
    timing: TimingConfig,
    last_status: Option<TouchStatus>,
    tx_bytes: u64,
    rx_lines: u64,
    commands_sent: u64,
}

impl Connection<SerialTransport> {
    /// Open the serial port and wait for the device to come out of reset
    pub fn open(config: ConnectionConfig) -> Result<Self, ProtocolError> {
        let transport = SerialTransport::open(&config.port_name, config.baud_rate)?;
        info!(
            "Connected to touch controller on {} at {} baud",
            config.port_name, config.baud_rate
        );

        let mut conn = Self::with_transport(transport, config.timing);
        let open_settle = Duration::from_millis(conn.timing.open_settle_ms);
        debug!(
            "connect: waiting {}ms after port open for device reset",
            open_settle.as_millis()
        );
        settle(open_settle);
        // Boot messages printed during the reset are not a response to anything
        conn.transport.clear_input()?;
        Ok(conn)
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an already open transport
    pub fn with_transport(transport: T, timing: TimingConfig) -> Self {
        Self {
            transport,
            timing,
            last_status: None,
            tx_bytes: 0,
            rx_lines: 0,
            commands_sent: 0,
        }
    }

    /// Protocol timing in use
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Status from the most recent successful query
    pub fn last_status(&self) -> Option<&TouchStatus> {
        self.last_status.as_ref()
    }

    /// Cumulative (bytes written, lines received, commands sent)
    pub fn get_counters(&self) -> (u64, u64, u64) {
        (self.tx_bytes, self.rx_lines, self.commands_sent)
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Close the session and hand back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send one raw command line and return the response lines.
    ///
    /// Writes `line` plus a newline, waits the response settle delay, then
    /// drains whatever the device printed. An empty vector means the device
    /// stayed silent for the whole drain window.
    pub fn send(&mut self, line: &str) -> Result<Vec<String>, ProtocolError> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.exchange(line, &bytes)
    }

    fn exchange(&mut self, line: &str, bytes: &[u8]) -> Result<Vec<String>, ProtocolError> {
        debug!("send: '{}'", line);
        self.transport.write(bytes)?;
        self.tx_bytes = self.tx_bytes.saturating_add(bytes.len() as u64);
        self.commands_sent = self.commands_sent.saturating_add(1);

        settle(Duration::from_millis(self.timing.response_settle_ms));

        let response = self
            .transport
            .drain_lines(Duration::from_millis(self.timing.drain_timeout_ms))?;
        self.rx_lines = self.rx_lines.saturating_add(response.len() as u64);
        debug!("send: '{}' -> {} lines {:?}", line, response.len(), response);
        Ok(response)
    }

    /// Send a typed command, failing with [`ProtocolError::Timeout`] on silence
    pub fn send_command(&mut self, command: Command) -> Result<Vec<String>, ProtocolError> {
        let response = self.exchange(&command.wire_form(), &command.to_bytes())?;
        if response.is_empty() {
            return Err(ProtocolError::Timeout);
        }
        Ok(response)
    }

    /// Send a command and report whether the device acknowledged it
    fn execute(&mut self, command: Command, settle_after: Duration) -> Result<bool, ProtocolError> {
        if command.changes_baseline() {
            self.last_status = None;
        }
        let response = self.send_command(command)?;
        let acknowledged = command.is_acknowledged(&response);
        if acknowledged {
            settle(settle_after);
        } else {
            debug!("execute: '{}' not acknowledged: {:?}", command, response);
        }
        Ok(acknowledged)
    }

    /// Query the current touch status
    pub fn query_status(&mut self) -> Result<TouchStatus, ProtocolError> {
        let response = self.send_command(Command::QueryStatus)?;
        let status = parse_status(&response).ok_or(ProtocolError::Timeout)?;
        self.last_status = Some(status.clone());
        Ok(status)
    }

    /// Set the global sensitivity level (1-5)
    pub fn set_sensitivity_level(&mut self, level: impl Into<i64>) -> Result<bool, ProtocolError> {
        let level = SensitivityLevel::new(level)?;
        let acknowledged = self.execute(Command::SetSensitivity(level), Duration::ZERO)?;
        if acknowledged {
            info!("Sensitivity level set to {} ({})", level, level.name());
        }
        Ok(acknowledged)
    }

    /// Set custom thresholds for one electrode.
    ///
    /// All values are validated before anything is written.
    pub fn set_electrode_threshold(
        &mut self,
        electrode: impl Into<i64>,
        touch: impl Into<i64>,
        release: impl Into<i64>,
    ) -> Result<bool, ProtocolError> {
        let electrode = ElectrodeId::new(electrode)?;
        let threshold = ElectrodeThreshold::new(touch, release)?;
        self.apply_threshold(electrode, threshold)
    }

    /// Set already-validated thresholds for one electrode
    pub fn apply_threshold(
        &mut self,
        electrode: ElectrodeId,
        threshold: ElectrodeThreshold,
    ) -> Result<bool, ProtocolError> {
        self.execute(
            Command::SetThreshold {
                electrode,
                threshold,
            },
            Duration::ZERO,
        )
    }

    /// Force a baseline recalibration and wait for it to finish
    pub fn force_calibration(&mut self) -> Result<bool, ProtocolError> {
        let settle_after = self.timing.settle_after(&Command::ForceCalibration);
        self.force_calibration_with_settle(settle_after)
    }

    /// Force a recalibration, waiting `settle_after` once it is acknowledged
    pub fn force_calibration_with_settle(
        &mut self,
        settle_after: Duration,
    ) -> Result<bool, ProtocolError> {
        self.execute(Command::ForceCalibration, settle_after)
    }

    /// Restore the firmware's default touch configuration
    pub fn reset_to_defaults(&mut self) -> Result<bool, ProtocolError> {
        let settle_after = self.timing.settle_after(&Command::Reset);
        self.execute(Command::Reset, settle_after)
    }

    /// Close the session, releasing the link
    pub fn close(self) {
        let (tx, rx, commands) = self.get_counters();
        info!(
            "Disconnected ({} commands, {} bytes sent, {} lines received)",
            commands, tx, rx
        );
    }
}
