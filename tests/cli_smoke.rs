//! End-to-end runs of the `fpga-testkit` binary.

mod common;

use common::{write_file, SAMPLE_VCD};
use std::process::{Command, Output};

fn testkit(args: &[&str], cwd: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fpga-testkit"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("FPGA_TESTKIT_CONFIG")
        .output()
        .expect("failed to run fpga-testkit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_vcd_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = testkit(&["vcd", "nothing.vcd"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: File not found: nothing.vcd"));
}

#[test]
fn test_vcd_json_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "dump.vcd", SAMPLE_VCD);

    let output = testkit(&["vcd", "dump.vcd", "--signals", "clk,rst", "--format", "json"], dir.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["timescale"], "1ns");
    let signals = value["signals"].as_object().unwrap();
    assert_eq!(signals.len(), 2);
    assert!(signals.contains_key("clk"));
    assert!(signals.contains_key("rst"));
}

#[test]
fn test_vcd_filtered_output_file() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "dump.vcd", SAMPLE_VCD);

    let output = testkit(
        &["vcd", "dump.vcd", "--signals", "count", "--output", "count.vcd"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Open with: gtkwave count.vcd"));
    assert!(stdout(&output).is_empty());

    let filtered = std::fs::read_to_string(dir.path().join("count.vcd")).unwrap();
    assert!(filtered.contains("b0001 \""));
    assert!(!filtered.contains("$var wire 1 ! clk $end"));
}

#[test]
fn test_report_markdown_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "sim.json",
        r#"{"tests": [{"name": "tb_counter.v", "passed": true, "duration": 1.25}]}"#,
    );

    let output = testkit(&["report", "--sim", "sim.json"], dir.path());
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("# Test Report"));
    assert!(text.contains("- **Success Rate**: 100.0%"));
    assert!(text.contains("| tb_counter.v | ✅ PASS | 1.250s |"));
}

#[test]
fn test_report_warns_about_missing_results() {
    let dir = tempfile::tempdir().unwrap();
    let output = testkit(&["report", "--hw", "hw.json", "--format", "json"], dir.path());

    assert!(output.status.success());
    assert!(stderr(&output).contains("Warning: Could not load hw results:"));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["summary"]["total_tests"], 0);
}

#[test]
fn test_config_file_sets_report_format() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "testkit.toml", "[report]\nformat = \"json\"\n");

    let output = testkit(&["report"], dir.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(value.get("summary").is_some());
}

#[test]
fn test_sim_only_and_hw_only_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let output = testkit(&["regress", "--sim-only", "--hw-only"], dir.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_regress_on_empty_root_passes() {
    let dir = tempfile::tempdir().unwrap();
    let output = testkit(&["regress"], dir.path());

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("[WARN] No simulation tests found"));
    assert!(text.contains("*** All tests passed! ***"));
}

#[test]
fn test_sim_all_without_simulator_still_summarises() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "testkit.toml", "[sim]\niverilog = \"no-such-iverilog-4711\"\n");
    write_file(dir.path(), "simdir/tb_a.v", "module tb_a; endmodule\n");
    write_file(dir.path(), "simdir/tb_b.v", "module tb_b; endmodule\n");

    let output = testkit(&["sim-all", "--dir", "simdir", "--results", "out.json"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    let text = stdout(&output);
    assert!(text.contains("[ERROR] no-such-iverilog-4711 not found!"));
    assert!(text.contains("Total: 2 | Passed: 0 | Failed: 2"));
    assert!(text.contains("*** 2 test(s) failed! ***"));

    let saved = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["tests"].as_array().unwrap().len(), 2);
    assert_eq!(value["tests"][1]["name"], "tb_b.v");
    assert_eq!(value["tests"][1]["passed"], false);
}

#[test]
fn test_errors_are_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = testkit(&["vcd", "nothing.vcd"], dir.path());

    let err = stderr(&output);
    assert_eq!(err.matches("File not found: nothing.vcd").count(), 1);
    assert_eq!(err.trim_end(), "Error: File not found: nothing.vcd");
}
