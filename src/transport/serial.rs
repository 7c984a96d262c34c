//! Serial transport for the headset link
//!
//! Uses blocking threads:
//! - Reader thread: reads from serial port, sends chunks to channel
//! - Writer thread: receives from channel, writes to serial port
//!
//! The transport stops when:
//! - `shutdown` flag is set
//! - Serial port disconnects (read error, or too many empty reads)
//! - Write error occurs

use super::{Transport, TransportChannels};
use crate::config::DeviceConfig;
use crate::constants::{
    CHANNEL_CAPACITY, DEFAULT_READ_TIMEOUT_MS, SERIAL_BUFFER_SIZE, SERIAL_DISCONNECT_THRESHOLD,
};
use crate::error::{BridgeError, Result};
use bytes::Bytes;
use serialport::{SerialPortInfo, SerialPortType};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Serial transport for the ThinkGear link
///
/// # Example
///
/// ```ignore
/// let port = SerialTransport::detect(&config.device)?;
/// let channels = SerialTransport::new(&port, 57_600).spawn(shutdown)?;
/// ```
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Create a new serial transport for the specified port
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// List serial ports present on this machine
    pub fn available() -> Result<Vec<SerialPortInfo>> {
        serialport::available_ports().map_err(|e| BridgeError::PortEnumeration {
            source: io::Error::other(e.to_string()),
        })
    }

    /// Detect a device matching the given configuration
    ///
    /// Matches USB VID/PID first, then falls back to the platform name hint.
    ///
    /// # Errors
    ///
    /// - `NoDeviceFound` - No matching device found
    /// - `MultipleDevicesFound` - More than one matching device found
    pub fn detect(config: &DeviceConfig) -> Result<String> {
        let ports = Self::available()?;

        let matching: Vec<_> = ports.iter().filter(|p| matches_device(p, config)).collect();

        match matching.len() {
            0 => Err(BridgeError::NoDeviceFound),
            1 => Ok(matching[0].port_name.clone()),
            n => Err(BridgeError::MultipleDevicesFound { count: n }),
        }
    }

    /// Open the serial port
    pub fn open(&self) -> Result<Box<dyn serialport::SerialPort>> {
        serialport::new(&self.port_name, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| BridgeError::SerialOpen {
                port: self.port_name.clone(),
                source: io::Error::other(e.to_string()),
            })
    }
}

/// One-line description of a port for listings
pub fn describe(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => format!(
            "{}  USB {:04X}:{:04X} {}",
            port.port_name,
            usb.vid,
            usb.pid,
            usb.product.as_deref().unwrap_or("")
        ),
        SerialPortType::BluetoothPort => format!("{}  Bluetooth", port.port_name),
        SerialPortType::PciPort => format!("{}  PCI", port.port_name),
        SerialPortType::Unknown => port.port_name.clone(),
    }
}

/// Check if a serial port matches the device configuration
fn matches_device(port: &SerialPortInfo, config: &DeviceConfig) -> bool {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => usb.vid == config.vid && config.pid_list.contains(&usb.pid),
        _ => config
            .name_hint
            .current()
            .map(|hint| port.port_name.contains(hint))
            .unwrap_or(false),
    }
}

impl Transport for SerialTransport {
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels> {
        let (in_tx, in_rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_CAPACITY);
        let (out_tx, mut out_rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

        let port_read = self.open()?;
        let port_write = port_read.try_clone().map_err(|e| BridgeError::SerialOpen {
            port: self.port_name.clone(),
            source: io::Error::other(e.to_string()),
        })?;

        // Reader thread (blocking)
        let shutdown_reader = shutdown.clone();
        let port_name = self.port_name.clone();
        std::thread::spawn(move || {
            let mut port = port_read;
            let mut buf = [0u8; SERIAL_BUFFER_SIZE];
            let mut empty_reads = 0u32;

            while !shutdown_reader.load(Ordering::Relaxed) {
                match port.read(&mut buf) {
                    Ok(n) if n > 0 => {
                        empty_reads = 0;
                        if in_tx
                            .blocking_send(Ok(Bytes::copy_from_slice(&buf[..n])))
                            .is_err()
                        {
                            // Receiver dropped
                            break;
                        }
                    }
                    Ok(_) => {
                        empty_reads += 1;
                        if empty_reads > SERIAL_DISCONNECT_THRESHOLD {
                            let _ = in_tx.blocking_send(Err(io::Error::new(
                                io::ErrorKind::UnexpectedEof,
                                "serial port returned no data",
                            )));
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                        empty_reads = 0;
                    }
                    Err(e) => {
                        let _ = in_tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
            debug!("Serial reader for {} stopped", port_name);
        });

        // Writer thread (blocking)
        std::thread::spawn(move || {
            let mut port = port_write;

            while let Some(data) = out_rx.blocking_recv() {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if port.write_all(&data).and_then(|_| port.flush()).is_err() {
                    break;
                }
            }
        });

        Ok(TransportChannels {
            rx: in_rx,
            tx: out_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb_port(name: &str, vid: u16, pid: u16) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid,
                serial_number: None,
                manufacturer: None,
                product: Some("CP2102".to_string()),
            }),
        }
    }

    #[test]
    fn test_serial_transport_new() {
        let transport = SerialTransport::new("COM3", 57_600);
        assert_eq!(transport.port_name, "COM3");
        assert_eq!(transport.baud_rate, 57_600);
        assert_eq!(
            transport.read_timeout,
            Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_with_read_timeout() {
        let transport =
            SerialTransport::new("/dev/rfcomm0", 57_600).with_read_timeout(Duration::from_millis(5));
        assert_eq!(transport.read_timeout, Duration::from_millis(5));
    }

    #[test]
    fn test_matches_usb_vid_pid() {
        let config = DeviceConfig::default();
        assert!(matches_device(&usb_port("COM5", 0x10C4, 0xEA60), &config));
        assert!(!matches_device(&usb_port("COM5", 0x10C4, 0x0001), &config));
        assert!(!matches_device(&usb_port("COM5", 0x16C0, 0xEA60), &config));
    }

    #[test]
    fn test_non_usb_port_without_hint_does_not_match() {
        let config = DeviceConfig::default();
        let port = SerialPortInfo {
            port_name: "/dev/rfcomm0".to_string(),
            port_type: SerialPortType::BluetoothPort,
        };
        assert!(!matches_device(&port, &config));
    }

    #[test]
    fn test_describe_usb_port() {
        let text = describe(&usb_port("COM5", 0x10C4, 0xEA60));
        assert!(text.starts_with("COM5"));
        assert!(text.contains("10C4:EA60"));
    }
}
