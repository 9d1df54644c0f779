//! PlatformIO hardware runs with a scripted `pio`.

mod common;

use common::{exited, ok, FakeRunner, PIO_OUTPUT};
use fpga_testkit::config::HwConfig;
use fpga_testkit::hw::{HwError, HwRunner};
use std::path::Path;

#[tokio::test]
async fn test_results_recovered_from_pio_output() {
    let runner = FakeRunner::new();
    runner.script("pio", Ok(exited(1, PIO_OUTPUT, "")));
    let hw = HwRunner::new(&runner, HwConfig::default());

    let mut out = Vec::new();
    let outcome = hw.run(Path::new("tests/hw"), &mut out).await.unwrap();

    assert!(!outcome.passed());
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(outcome.results.total(), 5);
    assert_eq!(outcome.results.failed(), 1);
    let failed = &outcome.results.records()[4];
    assert_eq!(failed.name, "test_array_comparison");
    assert_eq!(
        failed.error.as_deref(),
        Some("Element 2 Expected 0x03 Was 0x05")
    );
    assert_eq!(outcome.results.extra["suite"], "hardware");
    assert_eq!(outcome.results.extra["env"], "esp32");

    let call = &runner.calls_to("pio")[0];
    assert_eq!(call.display(), "pio test -e esp32");
    assert_eq!(call.cwd.as_deref(), Some(Path::new("tests/hw")));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Hardware Tests (esp32)"));
    assert!(text.contains("[FAIL] Hardware tests FAILED (exit code 1)"));
}

#[tokio::test]
async fn test_exit_code_decides_the_verdict() {
    // pio reporting success wins even if a line looks like a failure.
    let runner = FakeRunner::new();
    runner.script("pio", Ok(ok(PIO_OUTPUT)));
    let hw = HwRunner::new(&runner, HwConfig::default());

    let mut out = Vec::new();
    let outcome = hw.run(Path::new("."), &mut out).await.unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.results.failed(), 1);
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("[PASS] Hardware tests PASSED"));
}

#[tokio::test]
async fn test_unrecognised_output_becomes_one_record() {
    let runner = FakeRunner::new();
    runner.script("pio", Ok(exited(2, "Error: Please specify `upload_port`\n", "")));
    let config = HwConfig {
        env: "esp32dev".to_string(),
        ..HwConfig::default()
    };
    let hw = HwRunner::new(&runner, config);

    let outcome = hw.run(Path::new("."), &mut Vec::new()).await.unwrap();
    assert_eq!(outcome.results.total(), 1);
    let record = &outcome.results.records()[0];
    assert_eq!(record.name, "pio test -e esp32dev");
    assert!(!record.passed);
    let error = record.error.as_deref().unwrap();
    assert!(error.starts_with("exit code 2\n"));
    assert!(error.contains("upload_port"));
}

#[tokio::test]
async fn test_silent_success_is_a_single_pass() {
    let runner = FakeRunner::new();
    let hw = HwRunner::new(&runner, HwConfig::default());

    let outcome = hw.run(Path::new("."), &mut Vec::new()).await.unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.results.total(), 1);
    assert!(outcome.results.records()[0].passed);
    assert!(outcome.summary.is_none());
}

#[tokio::test]
async fn test_unity_summary_is_kept() {
    let stdout = "test/test_example.cpp:119:test_basic_operation:PASS\n\
-----------------------\n\
1 Tests 0 Failures 0 Ignored\n\
OK\n";
    let runner = FakeRunner::new();
    runner.script("pio", Ok(ok(stdout)));
    let hw = HwRunner::new(&runner, HwConfig::default());

    let outcome = hw.run(Path::new("."), &mut Vec::new()).await.unwrap();
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.tests, 1);
    assert!(summary.passed());
}

#[tokio::test]
async fn test_missing_pio() {
    let runner = FakeRunner::new();
    runner.missing("pio");
    let hw = HwRunner::new(&runner, HwConfig::default());

    let mut out = Vec::new();
    let err = hw.run(Path::new("."), &mut out).await.unwrap_err();
    assert!(matches!(err, HwError::ToolNotFound { ref tool } if tool == "pio"));
    assert!(err.to_string().contains("https://platformio.org/install"));
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("[ERROR] PlatformIO CLI (pio) not found!"));
}
