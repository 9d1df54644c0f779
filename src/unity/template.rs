//! The hardware-in-the-loop test template.
//!
//! Five checks that prove a board boots, keeps time, talks over serial and
//! runs the test framework. Copy the template and replace the checks with
//! real ones for a new board.

use super::{
    assert_equal, assert_equal_hex8, assert_equal_hex8_array, assert_greater_than,
    assert_less_than, assert_true, Board, Chip, Fixture, Level, PinMode, SessionReport,
    TestResult, UnitySession, LED_PIN,
};
use std::io::{self, Write};

pub const BAUD_RATE: u32 = 115_200;

/// Time the serial link gets to come up before anything is printed.
pub const BOOT_DELAY_MS: u32 = 2000;

/// How long `test_led_timing` holds the LED high.
pub const LED_DELAY_MS: u32 = 100;
/// Accepted window around [`LED_DELAY_MS`], in microseconds (10%).
pub const LED_MIN_US: u32 = 90_000;
pub const LED_MAX_US: u32 = 110_000;

/// Names of the template's tests, in run order.
pub const TESTS: [&str; 5] = [
    "test_basic_operation",
    "test_led_timing",
    "test_serial_ready",
    "test_hex_values",
    "test_array_comparison",
];

/// The template's fixture; `set_up` and `tear_down` have nothing to do.
pub struct Template<'b, B: Board> {
    pub board: &'b mut B,
}

impl<B: Board> Fixture for Template<'_, B> {}

pub fn test_basic_operation<B: Board>(_board: &mut B) -> TestResult {
    assert_equal(42, 42)
}

pub fn test_led_timing<B: Board>(board: &mut B) -> TestResult {
    board.pin_mode(LED_PIN, PinMode::Output);
    board.digital_write(LED_PIN, Level::High);

    let start = board.micros();
    board.delay_ms(LED_DELAY_MS);
    let duration = board.micros().wrapping_sub(start);

    assert_greater_than(LED_MIN_US, duration)?;
    assert_less_than(LED_MAX_US, duration)?;

    board.digital_write(LED_PIN, Level::Low);
    Ok(())
}

pub fn test_serial_ready<B: Board>(board: &mut B) -> TestResult {
    assert_true(board.serial_ready())?;
    if board.chip() == Chip::Esp32 {
        assert_true(board.serial_ready())?;
    }
    Ok(())
}

pub fn test_hex_values<B: Board>(_board: &mut B) -> TestResult {
    assert_equal_hex8(0xAA, 0xAA)
}

pub fn test_array_comparison<B: Board>(_board: &mut B) -> TestResult {
    let expected = [0x01, 0x02, 0x03, 0x04];
    let actual = [0x01, 0x02, 0x03, 0x04];
    assert_equal_hex8_array(&expected, &actual, 4)
}

/// Boot entry: wait for the link, announce, run every test once and report.
/// There is no loop stage; the tests do not run again until the next boot.
pub fn setup<B: Board, W: Write>(
    board: &mut B,
    out: W,
    boot_delay_ms: u32,
) -> io::Result<SessionReport> {
    board.delay_ms(boot_delay_ms);
    board.serial_begin(BAUD_RATE);
    board.serial_println("Starting tests...");

    let mut fixture = Template { board };
    let mut session = UnitySession::begin(file!(), out);
    session.run_test(&mut fixture, TESTS[0], |t| test_basic_operation(&mut *t.board))?;
    session.run_test(&mut fixture, TESTS[1], |t| test_led_timing(&mut *t.board))?;
    session.run_test(&mut fixture, TESTS[2], |t| test_serial_ready(&mut *t.board))?;
    session.run_test(&mut fixture, TESTS[3], |t| test_hex_values(&mut *t.board))?;
    session.run_test(&mut fixture, TESTS[4], |t| test_array_comparison(&mut *t.board))?;
    let report = session.end()?;

    fixture.board.serial_println("Tests complete!");
    Ok(report)
}
