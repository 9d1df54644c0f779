//! Core traits for the board console.
//!
//! `ConsolePort` lets the monitor read a board's serial console from either a
//! real port or a scripted mock.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line settings for a board console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits.
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Read timeout.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    /// 115200 8N1, the rate the on-target template calls `serial_begin` with.
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(100),
        }
    }
}

impl PortConfiguration {
    /// 8N1 at the given baud rate with the given read timeout.
    pub fn console(baud_rate: u32, timeout: Duration) -> Self {
        Self {
            baud_rate,
            timeout,
            ..Self::default()
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// A board's serial console.
pub trait ConsolePort: Send + std::fmt::Debug {
    /// Read available bytes into `buffer`, returning how many were read.
    ///
    /// Implementations report "nothing arrived yet" as `PortError::Timeout`
    /// or an I/O error of kind `TimedOut`/`WouldBlock`.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Write bytes to the board, returning how many were written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Name/path of this port.
    fn name(&self) -> &str;

    /// Discard anything the board sent before we started listening.
    fn clear_input(&mut self) -> Result<(), PortError>;
}

/// A serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSummary {
    pub port_name: String,
    pub kind: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// Enumerate serial ports on this host.
pub fn list_ports() -> Result<Vec<PortSummary>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| match p.port_type {
            serialport::SerialPortType::UsbPort(usb) => PortSummary {
                port_name: p.port_name,
                kind: format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            serialport::SerialPortType::PciPort => PortSummary {
                port_name: p.port_name,
                kind: "pci".to_string(),
                manufacturer: None,
                product: None,
            },
            serialport::SerialPortType::BluetoothPort => PortSummary {
                port_name: p.port_name,
                kind: "bluetooth".to_string(),
                manufacturer: None,
                product: None,
            },
            serialport::SerialPortType::Unknown => PortSummary {
                port_name: p.port_name,
                kind: "unknown".to_string(),
                manufacturer: None,
                product: None,
            },
        })
        .collect())
}
