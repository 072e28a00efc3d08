//! Serial port handling
//!
//! Provides low-level serial port access and the [`SerialTransport`] used
//! against real hardware.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::BTreeMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::transport::split_lines;
use super::{ProtocolError, Transport, DEFAULT_BAUD_RATE, READ_POLL_TIMEOUT_MS};

/// Quiet period that ends a drain once data has started arriving
const INTER_LINE_GAP: Duration = Duration::from_millis(50);

/// A serial port the controller board might be attached to
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Device path or COM name, as passed to `--port`
    pub name: String,
    /// USB vendor id of the bridge chip
    pub vid: Option<u16>,
    /// USB product id of the bridge chip
    pub pid: Option<u16>,
    /// Product string reported by the bridge
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Native USB boards show up as ttyACM, CP210x/CH340 bridges as ttyUSB
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let numbered = |prefix: &str| {
        basename
            .strip_prefix(prefix)
            .map(|n| n.parse::<usize>().unwrap_or(usize::MAX))
    };
    match (numbered("ttyACM"), numbered("ttyUSB")) {
        (Some(n), _) => (0, n, basename.to_string()),
        (_, Some(n)) => (1, n, basename.to_string()),
        _ => (2, 0, basename.to_string()),
    }
}

/// Candidate ports for the tuner, likeliest first
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: BTreeMap<String, PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| {
            let port = PortInfo::from(info);
            (port.name.clone(), port)
        })
        .collect();

    // udev may not have announced a freshly plugged board yet
    #[cfg(target_os = "linux")]
    for entry in fs::read_dir("/dev").into_iter().flatten().flatten() {
        let Some(fname) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
            let path = format!("/dev/{}", fname);
            ports
                .entry(path.clone())
                .or_insert_with(|| PortInfo::bare(path));
        }
    }

    let mut ports: Vec<PortInfo> = ports.into_values().collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Open a serial port with a short read timeout for polling
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    serialport::new(name, baud)
        .timeout(Duration::from_millis(READ_POLL_TIMEOUT_MS))
        .open()
        .map_err(|e| ProtocolError::ConnectionFailed(format!("{}: {}", name, e)))
}

/// Configure a serial port for 8N1 without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

    // Some USB bridges leave the board held in reset until DTR/RTS are asserted
    if let Err(e) = port.write_data_terminal_ready(true) {
        warn!("configure_port: failed to set DTR high: {} (continuing)", e);
    }
    if let Err(e) = port.write_request_to_send(true) {
        warn!("configure_port: failed to set RTS high: {} (continuing)", e);
    }

    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

/// [`Transport`] over a real serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open and configure `name` at `baud_rate`
    pub fn open(name: &str, baud_rate: u32) -> Result<Self, ProtocolError> {
        let mut port = open_port(name, Some(baud_rate))?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;
        debug!("SerialTransport::open: {} at {} baud", name, baud_rate);
        Ok(Self {
            port,
            name: name.to_string(),
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn drain_lines(&mut self, timeout: Duration) -> Result<Vec<String>, ProtocolError> {
        let mut response = Vec::new();
        let mut buffer = [0u8; 512];
        let start = Instant::now();
        let mut last_data_time = Instant::now();

        loop {
            if start.elapsed() > timeout {
                break;
            }

            let available = self
                .port
                .bytes_to_read()
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

            if available > 0 {
                let to_read = std::cmp::min(available as usize, buffer.len());
                match self.port.read(&mut buffer[..to_read]) {
                    Ok(0) => break,
                    Ok(n) => {
                        response.extend_from_slice(&buffer[..n]);
                        last_data_time = Instant::now();
                    }
                    Err(ref e)
                        if e.kind() == std::io::ErrorKind::TimedOut
                            || e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(ProtocolError::IoError(e)),
                }
            } else if !response.is_empty() && last_data_time.elapsed() > INTER_LINE_GAP {
                break;
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        debug!(
            "drain_lines {}: received {} bytes in {}ms",
            self.name,
            response.len(),
            start.elapsed().as_millis()
        );
        Ok(split_lines(&response))
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Only checks that enumeration does not panic
        let ports = list_ports();
        for port in &ports {
            println!("Found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_port_sorting() {
        let names = vec![
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
        ];
        let mut ports: Vec<PortInfo> = names
            .into_iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect();

        ports.sort_by_key(|p| port_sort_key(&p.name));
        let ordered: Vec<String> = ports.into_iter().map(|p| p.name).collect();

        assert_eq!(
            ordered,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_open_missing_port_is_connection_failure() {
        let result = SerialTransport::open("/dev/touchtune-does-not-exist", DEFAULT_BAUD_RATE);
        assert!(matches!(result, Err(ProtocolError::ConnectionFailed(_))));
    }
}
