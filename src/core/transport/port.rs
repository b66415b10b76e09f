//! Access to physical serial ports.
//!
//! The session never talks to `serialport` directly; it asks a
//! [`PortProvider`] for a [`DeviceLink`], which keeps the lifecycle testable
//! with in-memory links.

use serde::Serialize;
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::error::TransportError;

/// Read timeout of a physical port. Bounds how long a cancelled session
/// waits for its reader to notice.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A byte stream to the device. Reads may return `TimedOut`/`WouldBlock`
/// when no data is pending; the reader keeps polling in that case.
pub trait DeviceLink: Read + Write + Send {
    /// Second handle onto the same port, used as the dedicated reader
    fn try_clone_link(&self) -> io::Result<Box<dyn DeviceLink>>;
}

impl DeviceLink for Box<dyn serialport::SerialPort> {
    fn try_clone_link(&self) -> io::Result<Box<dyn DeviceLink>> {
        let clone = self.as_ref().try_clone().map_err(io::Error::from)?;
        Ok(Box::new(clone))
    }
}

/// Description of an available port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Source of device links
pub trait PortProvider: Send + Sync {
    /// Ports currently visible to the host
    fn available(&self) -> Result<Vec<PortInfo>, TransportError>;

    /// Open `path` at `baud`
    fn open(&self, path: &str, baud: u32) -> Result<Box<dyn DeviceLink>, TransportError>;

    /// Pick a port when none was configured: the only one available, or
    /// the first one that looks like a USB serial adapter.
    fn auto_select(&self) -> Result<String, TransportError> {
        let ports = self.available()?;
        match ports.as_slice() {
            [] => Err(TransportError::connect_failed("auto", "no serial ports found")),
            [only] => Ok(only.name.clone()),
            many => Ok(many
                .iter()
                .find(|p| p.description.starts_with("USB"))
                .unwrap_or(&many[0])
                .name
                .clone()),
        }
    }
}

/// Ports of the host, opened through `serialport`
#[derive(Debug, Clone, Default)]
pub struct SerialPortProvider;

impl SerialPortProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PortProvider for SerialPortProvider {
    fn available(&self) -> Result<Vec<PortInfo>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::unsupported(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe_port_type(&p.port_type),
                name: p.port_name,
            })
            .collect())
    }

    fn open(&self, path: &str, baud: u32) -> Result<Box<dyn DeviceLink>, TransportError> {
        let port = serialport::new(path, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::connect_failed(path, e))?;

        Ok(Box::new(port))
    }
}

fn describe_port_type(port_type: &serialport::SerialPortType) -> String {
    use serialport::SerialPortType;

    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.clone().unwrap_or_else(|| "serial adapter".to_string());
            format!("USB {} ({:04x}:{:04x})", product, usb.vid, usb.pid)
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}
