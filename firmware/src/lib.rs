//! On-target half of the hardware-in-the-loop template.
//!
//! The five template checks are written against [`Hal`] so the Unity-style
//! firmware (`src/main.rs`) and the `embedded-test` suite
//! (`tests/hil_template.rs`) run the same code. [`Session`] prints results in
//! Unity's line format so `fpga-testkit monitor` can read them off the UART.

#![no_std]

use core::fmt::{self, Write};
use core::panic::Location;

pub const BAUD_RATE: u32 = 115_200;
pub const BOOT_DELAY_MS: u32 = 2000;
pub const LED_DELAY_MS: u32 = 100;
pub const LED_MIN_US: u32 = 90_000;
pub const LED_MAX_US: u32 = 110_000;

/// What the template needs from the board.
pub trait Hal {
    fn set_led(&mut self, high: bool);
    /// Microseconds since boot, wrapping at `u32::MAX`.
    fn micros(&self) -> u32;
    fn delay_ms(&mut self, ms: u32);
    fn serial_ready(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Equal { expected: i64, actual: i64 },
    GreaterThan { threshold: u32, actual: u32 },
    LessThan { threshold: u32, actual: u32 },
    NotTrue,
    Hex8 { expected: u8, actual: u8 },
    Hex8Element { index: usize, expected: u8, actual: u8 },
    Length { expected: usize, actual: usize },
    Nothing,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Equal { expected, actual } => write!(f, "Expected {} Was {}", expected, actual),
            Self::GreaterThan { threshold, actual } => {
                write!(f, "Expected greater than {} Was {}", threshold, actual)
            }
            Self::LessThan { threshold, actual } => {
                write!(f, "Expected less than {} Was {}", threshold, actual)
            }
            Self::NotTrue => f.write_str("Expected TRUE Was FALSE"),
            Self::Hex8 { expected, actual } => {
                write!(f, "Expected 0x{:02X} Was 0x{:02X}", expected, actual)
            }
            Self::Hex8Element {
                index,
                expected,
                actual,
            } => write!(
                f,
                "Element {} Expected 0x{:02X} Was 0x{:02X}",
                index, expected, actual
            ),
            Self::Length { expected, actual } => {
                write!(f, "Expected {} elements Was {}", expected, actual)
            }
            Self::Nothing => f.write_str("You asked me to compare nothing, which was pointless."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub line: u32,
    pub message: Message,
}

pub type TestResult = Result<(), Failure>;

#[track_caller]
fn failure(message: Message) -> Failure {
    Failure {
        line: Location::caller().line(),
        message,
    }
}

#[track_caller]
pub fn assert_equal(expected: i64, actual: i64) -> TestResult {
    if expected == actual {
        return Ok(());
    }
    Err(failure(Message::Equal { expected, actual }))
}

#[track_caller]
pub fn assert_greater_than(threshold: u32, actual: u32) -> TestResult {
    if actual > threshold {
        return Ok(());
    }
    Err(failure(Message::GreaterThan { threshold, actual }))
}

#[track_caller]
pub fn assert_less_than(threshold: u32, actual: u32) -> TestResult {
    if actual < threshold {
        return Ok(());
    }
    Err(failure(Message::LessThan { threshold, actual }))
}

#[track_caller]
pub fn assert_true(condition: bool) -> TestResult {
    if condition {
        return Ok(());
    }
    Err(failure(Message::NotTrue))
}

#[track_caller]
pub fn assert_equal_hex8(expected: u8, actual: u8) -> TestResult {
    if expected == actual {
        return Ok(());
    }
    Err(failure(Message::Hex8 { expected, actual }))
}

#[track_caller]
pub fn assert_equal_hex8_array(expected: &[u8], actual: &[u8], len: usize) -> TestResult {
    if len == 0 {
        return Err(failure(Message::Nothing));
    }
    if expected.len() < len || actual.len() < len {
        return Err(failure(Message::Length {
            expected: len,
            actual: expected.len().min(actual.len()),
        }));
    }
    for index in 0..len {
        if expected[index] != actual[index] {
            return Err(failure(Message::Hex8Element {
                index,
                expected: expected[index],
                actual: actual[index],
            }));
        }
    }
    Ok(())
}

pub fn test_basic_operation<H: Hal>(_hal: &mut H) -> TestResult {
    assert_equal(42, 42)
}

pub fn test_led_timing<H: Hal>(hal: &mut H) -> TestResult {
    hal.set_led(true);

    let start = hal.micros();
    hal.delay_ms(LED_DELAY_MS);
    let duration = hal.micros().wrapping_sub(start);

    assert_greater_than(LED_MIN_US, duration)?;
    assert_less_than(LED_MAX_US, duration)?;

    hal.set_led(false);
    Ok(())
}

/// On ESP32 the check runs twice.
pub fn test_serial_ready<H: Hal>(hal: &mut H) -> TestResult {
    assert_true(hal.serial_ready())?;
    assert_true(hal.serial_ready())
}

pub fn test_hex_values<H: Hal>(_hal: &mut H) -> TestResult {
    assert_equal_hex8(0xAA, 0xAA)
}

pub fn test_array_comparison<H: Hal>(_hal: &mut H) -> TestResult {
    let expected: [u8; 4] = [0x01, 0x02, 0x03, 0x04];
    let actual: [u8; 4] = [0x01, 0x02, 0x03, 0x04];
    assert_equal_hex8_array(&expected, &actual, 4)
}

/// Unity-format reporter writing to any `core::fmt::Write` sink.
pub struct Session<'f> {
    file: &'f str,
    tests: u32,
    failures: u32,
}

impl<'f> Session<'f> {
    pub fn begin(file: &'f str) -> Self {
        Self {
            file,
            tests: 0,
            failures: 0,
        }
    }

    #[track_caller]
    pub fn run_test<H: Hal, W: Write>(
        &mut self,
        out: &mut W,
        hal: &mut H,
        name: &str,
        test: fn(&mut H) -> TestResult,
    ) -> fmt::Result {
        let call_line = Location::caller().line();
        self.tests += 1;
        match test(hal) {
            Ok(()) => write!(out, "{}:{}:{}:PASS\r\n", self.file, call_line, name),
            Err(f) => {
                self.failures += 1;
                write!(
                    out,
                    "{}:{}:{}:FAIL: {}\r\n",
                    self.file, f.line, name, f.message
                )
            }
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn end<W: Write>(self, out: &mut W) -> fmt::Result {
        write!(out, "\r\n-----------------------\r\n")?;
        write!(out, "{} Tests {} Failures 0 Ignored\r\n", self.tests, self.failures)?;
        write!(out, "{}\r\n", if self.failures == 0 { "OK" } else { "FAIL" })
    }
}
