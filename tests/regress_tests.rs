//! Regression runs over a temporary library root.

mod common;

use common::{exited, ok, write_file, FakeRunner, PIO_OUTPUT};
use fpga_testkit::config::Config;
use fpga_testkit::regress::{RegressOptions, Regression};
use fpga_testkit::results::SuiteResults;

fn options(root: &std::path::Path) -> RegressOptions {
    RegressOptions {
        root: root.to_path_buf(),
        ..RegressOptions::default()
    }
}

fn library_root() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "tests/sim/tb_counter.v", "module tb_counter; endmodule\n");
    write_file(root.path(), "tests/hw/platformio.ini", "[env:esp32]\nplatform = espressif32\n");
    root
}

#[tokio::test]
async fn test_missing_suites_warn_and_pass() {
    let root = tempfile::tempdir().unwrap();
    let runner = FakeRunner::new();
    let config = Config::default();

    let mut out = Vec::new();
    let outcome = Regression::new(&runner, &config)
        .run(&options(root.path()), &mut out)
        .await
        .unwrap();

    assert!(outcome.passed());
    assert_eq!(outcome.stages.len(), 2);
    assert!(outcome.stages.iter().all(|s| s.results.is_none()));
    assert!(runner.calls().is_empty());

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[WARN] No simulation tests found (tests/sim/ does not exist)"));
    assert!(text.contains("[WARN] No hardware tests found (tests/hw/ does not exist)"));
    assert!(text.contains("[PASS] Simulation: PASS"));
    assert!(text.contains("[PASS] Hardware: PASS"));
    assert!(text.trim_end().ends_with("*** All tests passed! ***"));
}

#[tokio::test]
async fn test_quiet_run_hides_passing_output() {
    let root = library_root();
    let runner = FakeRunner::new();
    runner.script("pio", Ok(ok("")));
    let config = Config::default();

    let mut out = Vec::new();
    let outcome = Regression::new(&runner, &config)
        .run(&options(root.path()), &mut out)
        .await
        .unwrap();

    assert!(outcome.passed());
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Running Simulation Tests"));
    assert!(text.contains("[PASS] Simulation tests PASSED"));
    assert!(text.contains("[PASS] Hardware tests PASSED"));
    assert!(!text.contains("Compiling:"));
}

#[tokio::test]
async fn test_failed_stage_replays_its_output() {
    let root = library_root();
    let runner = FakeRunner::new();
    runner.script("pio", Ok(exited(1, PIO_OUTPUT, "")));
    let config = Config::default();

    let mut out = Vec::new();
    let outcome = Regression::new(&runner, &config)
        .run(&options(root.path()), &mut out)
        .await
        .unwrap();

    assert!(!outcome.passed());
    assert!(outcome.stages[0].passed);
    assert!(!outcome.stages[1].passed);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[FAIL] Hardware tests FAILED"));
    assert!(text.contains("test_array_comparison: Element 2 Expected 0x03 Was 0x05"));
    assert!(text.contains("[FAIL] Hardware: FAIL"));
    assert!(text.contains("*** Some tests failed! ***"));
}

#[tokio::test]
async fn test_missing_simulator_fails_the_stage_and_keeps_results() {
    let root = library_root();
    let results_dir = root.path().join("results");
    let runner = FakeRunner::new();
    runner.missing("iverilog");
    let config = Config::default();
    let opts = RegressOptions {
        run_hw: false,
        results_dir: Some(results_dir.clone()),
        ..options(root.path())
    };

    let mut out = Vec::new();
    let outcome = Regression::new(&runner, &config)
        .run(&opts, &mut out)
        .await
        .unwrap();

    assert!(!outcome.passed());
    assert_eq!(outcome.stages.len(), 1);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[FAIL] Simulation tests FAILED"));
    assert!(text.contains("[ERROR] iverilog not found!"));
    assert!(text.contains("Total: 1 | Passed: 0 | Failed: 1"));
    assert!(!text.contains("Running Hardware Tests"));

    let sim = SuiteResults::load(results_dir.join("sim.json")).unwrap();
    assert_eq!(sim.failed(), 1);
}

#[tokio::test]
async fn test_verbose_streams_everything() {
    let root = library_root();
    let runner = FakeRunner::new();
    let config = Config::default();
    let opts = RegressOptions {
        run_hw: false,
        verbose: true,
        ..options(root.path())
    };

    let mut out = Vec::new();
    Regression::new(&runner, &config)
        .run(&opts, &mut out)
        .await
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Compiling: iverilog -g2012 -o tb_counter.vvp tb_counter.v"));
    assert!(text.contains("*** All simulation tests passed! ***"));
}

#[tokio::test]
async fn test_results_dir_gets_json_and_report() {
    let root = library_root();
    let results_dir = root.path().join("results");
    let runner = FakeRunner::new();
    runner.script("pio", Ok(exited(1, PIO_OUTPUT, "")));
    let config = Config::default();
    let opts = RegressOptions {
        results_dir: Some(results_dir.clone()),
        ..options(root.path())
    };

    let mut out = Vec::new();
    Regression::new(&runner, &config)
        .run(&opts, &mut out)
        .await
        .unwrap();

    let sim = SuiteResults::load(results_dir.join("sim.json")).unwrap();
    assert_eq!(sim.total(), 1);
    assert_eq!(sim.extra["suite"], "simulation");

    let hw = SuiteResults::load(results_dir.join("hw.json")).unwrap();
    assert_eq!(hw.total(), 5);
    assert_eq!(hw.failed(), 1);

    let report = std::fs::read_to_string(results_dir.join("report.md")).unwrap();
    assert!(report.starts_with("# Test Report"));
    assert!(report.contains("- **Total Tests**: 6"));
    assert!(report.contains("### Hardware: test_array_comparison"));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!("Results written to: {}", results_dir.display())));
}
