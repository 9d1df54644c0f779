//! Shared test utilities for fpga-testkit tests.
//!
//! This module provides common test infrastructure including:
//! - A scripted `ProcessRunner` standing in for iverilog, vvp and pio
//! - Sample VCD and runner output
//! - JSON assertion helpers

#![allow(dead_code)]

use async_trait::async_trait;
use fpga_testkit::process::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};
use fpga_testkit::toolchain::{HostPlatform, Toolchain};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

pub const SAMPLE_VCD: &str = "$date today $end
$timescale 1ns $end
$scope module tb_counter $end
$var wire 1 ! clk $end
$var reg 4 \" count [3:0] $end
$var wire 1 # rst $end
$upscope $end
$enddefinitions $end
#0
$dumpvars
0!
b0000 \"
1#
$end
#5
1!
#10
0!
0#
b0001 \"
#15
1!
";

/// Output of a PlatformIO 6 `pio test` run on an ESP32.
pub const PIO_OUTPUT: &str = "Verbosity level can be increased via `-v, -vv, or -vvv` option
Collected 1 tests

Processing * in esp32 environment
--------------------------------------------------------------------------------
Building & Uploading...
Testing...
If you don't see any output for the first 10 secs, please reset board (press reset button)

test/test_example.cpp:119: test_basic_operation\t[PASSED]
test/test_example.cpp:120: test_led_timing\t[PASSED]
test/test_example.cpp:121: test_serial_ready\t[PASSED]
test/test_example.cpp:122: test_hex_values\t[PASSED]
test/test_example.cpp:82: test_array_comparison: Element 2 Expected 0x03 Was 0x05\t[FAILED]
----------------- esp32:* [FAILED] Took 18.41 seconds -----------------

=================================== SUMMARY ===================================
Environment    Test    Status    Duration
-------------  ------  --------  ------------
esp32          *       FAILED    00:00:18.410
================= 5 test cases: 1 failed, 4 succeeded in 00:00:18.410 =================
";

/// Successful process output.
pub fn ok(stdout: &str) -> ProcessOutput {
    exited(0, stdout, "")
}

pub fn exited(code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        elapsed: Duration::from_millis(250),
    }
}

/// A toolchain that never wraps commands, whatever the host.
pub fn plain_toolchain() -> Toolchain {
    Toolchain {
        platform: HostPlatform::Linux,
        oss_cad_suite: None,
    }
}

/// Runner that replays scripted results per program and records every call.
/// Programs without a script succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    scripts: Mutex<HashMap<String, VecDeque<Result<ProcessOutput, ProcessError>>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, program: &str, result: Result<ProcessOutput, ProcessError>) -> &Self {
        self.scripts
            .lock()
            .entry(program.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Make `program` look uninstalled.
    pub fn missing(&self, program: &str) -> &Self {
        self.script(
            program,
            Err(ProcessError::NotFound {
                program: program.to_string(),
            }),
        )
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        _timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        self.calls.lock().push(command.clone());
        let scripted = self
            .scripts
            .lock()
            .get_mut(&command.program)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(ok("")))
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write fixture");
}

/// Assert that a JSON value contains specific fields with expected values.
///
/// # Example
/// ```ignore
/// let actual = json!({"suite": "simulation", "tests": []});
/// let expected = json!({"suite": "simulation"});
/// assert_json_contains(&actual, &expected); // Passes - actual contains all of expected
/// ```
pub fn assert_json_contains(actual: &Value, expected: &Value) {
    match (actual, expected) {
        (Value::Object(actual_map), Value::Object(expected_map)) => {
            for (key, expected_value) in expected_map {
                let actual_value = actual_map
                    .get(key)
                    .unwrap_or_else(|| panic!("Expected key '{}' not found in actual JSON", key));
                assert_json_contains(actual_value, expected_value);
            }
        }
        (Value::Array(actual_arr), Value::Array(expected_arr)) => {
            assert_eq!(actual_arr.len(), expected_arr.len(), "Array lengths differ");
            for (actual_item, expected_item) in actual_arr.iter().zip(expected_arr.iter()) {
                assert_json_contains(actual_item, expected_item);
            }
        }
        _ => {
            assert_eq!(
                actual, expected,
                "JSON values differ: expected {:?}, got {:?}",
                expected, actual
            );
        }
    }
}
