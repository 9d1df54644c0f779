//! The slice of the board API the HIL template uses.

use std::collections::HashMap;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::warn;

/// On-board LED of ESP32 dev kits.
pub const LED_PIN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip {
    Esp32,
    Host,
}

pub trait Board {
    fn pin_mode(&mut self, pin: u8, mode: PinMode);

    fn digital_write(&mut self, pin: u8, level: Level);

    /// Microseconds since boot. Wraps at `u32::MAX` like the Arduino core.
    fn micros(&self) -> u32;

    fn delay_ms(&mut self, ms: u32);

    fn serial_begin(&mut self, baud: u32);

    fn serial_println(&mut self, line: &str);

    fn serial_ready(&self) -> bool;

    fn chip(&self) -> Chip {
        Chip::Host
    }
}

/// Runs the template on the development machine: std clock, pin writes
/// recorded in memory, serial lines written to `W`.
#[derive(Debug)]
pub struct HostBoard<W: Write> {
    boot: Instant,
    pins: HashMap<u8, (PinMode, Level)>,
    baud: Option<u32>,
    serial: W,
}

impl<W: Write> HostBoard<W> {
    pub fn new(serial: W) -> Self {
        Self {
            boot: Instant::now(),
            pins: HashMap::new(),
            baud: None,
            serial,
        }
    }

    pub fn pin(&self, pin: u8) -> Option<(PinMode, Level)> {
        self.pins.get(&pin).copied()
    }

    pub fn baud(&self) -> Option<u32> {
        self.baud
    }

    pub fn into_serial(self) -> W {
        self.serial
    }
}

impl<W: Write> Board for HostBoard<W> {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.pins
            .entry(pin)
            .and_modify(|state| state.0 = mode)
            .or_insert((mode, Level::Low));
    }

    fn digital_write(&mut self, pin: u8, level: Level) {
        match self.pins.get_mut(&pin) {
            Some(state) => state.1 = level,
            None => warn!(pin, "digital_write on a pin that was never configured"),
        }
    }

    fn micros(&self) -> u32 {
        // Truncation is the wrap-around.
        self.boot.elapsed().as_micros() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn serial_begin(&mut self, baud: u32) {
        self.baud = Some(baud);
    }

    fn serial_println(&mut self, line: &str) {
        let written = writeln!(self.serial, "{}", line).and_then(|_| self.serial.flush());
        if let Err(e) = written {
            warn!("serial write failed: {}", e);
        }
    }

    fn serial_ready(&self) -> bool {
        self.baud.is_some()
    }
}
