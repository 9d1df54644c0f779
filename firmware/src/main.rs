//! HIL template firmware: runs the five checks once per boot and reports them
//! over UART0 in Unity's format.

#![no_std]
#![no_main]

use core::fmt::Write;
use esp_backtrace as _;
use esp_hal::{
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    time::Instant,
    uart::{Config as UartConfig, Uart},
};
use fpga_testkit_firmware::{
    test_array_comparison, test_basic_operation, test_hex_values, test_led_timing,
    test_serial_ready, Hal, Session, BAUD_RATE, BOOT_DELAY_MS,
};

struct Board<'d> {
    led: Output<'d>,
    delay: Delay,
    serial_ready: bool,
}

impl Hal for Board<'_> {
    fn set_led(&mut self, high: bool) {
        self.led.set_level(if high { Level::High } else { Level::Low });
    }

    fn micros(&self) -> u32 {
        // Truncation is the wrap-around.
        Instant::now().duration_since_epoch().as_micros() as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_millis(ms);
    }

    fn serial_ready(&self) -> bool {
        self.serial_ready
    }
}

#[esp_hal::main]
fn main() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let delay = Delay::new();

    delay.delay_millis(BOOT_DELAY_MS);

    let mut uart = Uart::new(peripherals.UART0, UartConfig::default().with_baudrate(BAUD_RATE))
        .expect("failed to init UART0")
        .with_rx(peripherals.GPIO3)
        .with_tx(peripherals.GPIO1);

    let mut board = Board {
        led: Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default()),
        delay,
        serial_ready: true,
    };

    // A failed UART write has nowhere to be reported; keep going.
    let _ = write!(uart, "Starting tests...\r\n");

    let mut session = Session::begin(file!());
    let _ = session.run_test(&mut uart, &mut board, "test_basic_operation", test_basic_operation);
    let _ = session.run_test(&mut uart, &mut board, "test_led_timing", test_led_timing);
    let _ = session.run_test(&mut uart, &mut board, "test_serial_ready", test_serial_ready);
    let _ = session.run_test(&mut uart, &mut board, "test_hex_values", test_hex_values);
    let _ = session.run_test(&mut uart, &mut board, "test_array_comparison", test_array_comparison);
    let _ = session.end(&mut uart);

    let _ = write!(uart, "Tests complete!\r\n");

    loop {
        core::hint::spin_loop();
    }
}
