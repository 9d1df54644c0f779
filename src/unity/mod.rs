//! A Unity-compatible test session for running the HIL template on the host.
//!
//! Output matches what the Unity C framework prints on the board, so the same
//! parsers read both:
//!
//! ```text
//! src/unity/template.rs:88:test_basic_operation:PASS
//! src/unity/template.rs:54:test_led_timing:FAIL: Expected less than 110000 Was 120112
//!
//! -----------------------
//! 5 Tests 1 Failures 0 Ignored
//! FAIL
//! ```

pub mod assert;
pub mod board;
pub mod template;

pub use assert::{
    assert_equal, assert_equal_hex8, assert_equal_hex8_array, assert_greater_than,
    assert_less_than, assert_true, fail, ignore, Abort, TestResult,
};
pub use board::{Board, Chip, HostBoard, Level, PinMode, LED_PIN};

use crate::results::{SuiteResults, TestRecord, UnitySummary};
use std::io::{self, Write};
use std::panic::Location;
use std::time::Instant;

/// Per-test hooks, run around every test of a session.
pub trait Fixture {
    fn set_up(&mut self) {}
    fn tear_down(&mut self) {}
}

/// What a finished session saw.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub summary: UnitySummary,
    pub records: Vec<TestRecord>,
}

impl SessionReport {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }

    pub fn into_results(self) -> SuiteResults {
        let mut results = SuiteResults::new("selftest");
        for record in self.records {
            results.push(record);
        }
        results
    }
}

/// `UNITY_BEGIN()` .. `RUN_TEST()` .. `UNITY_END()`.
pub struct UnitySession<W: Write> {
    file: String,
    out: W,
    summary: UnitySummary,
    records: Vec<TestRecord>,
}

impl<W: Write> UnitySession<W> {
    /// Start a session for tests defined in `file`.
    pub fn begin(file: impl Into<String>, out: W) -> Self {
        Self {
            file: file.into(),
            out,
            summary: UnitySummary {
                tests: 0,
                failures: 0,
                ignored: 0,
            },
            records: Vec::new(),
        }
    }

    /// Run one test with `fixture`'s hooks around it. A passing test is
    /// reported at the line of this call, a failing one at the assertion.
    #[track_caller]
    pub fn run_test<F, T>(&mut self, fixture: &mut F, name: &str, test: T) -> io::Result<()>
    where
        F: Fixture,
        T: FnOnce(&mut F) -> TestResult,
    {
        let call_line = Location::caller().line();
        let started = Instant::now();

        fixture.set_up();
        let outcome = test(fixture);
        fixture.tear_down();

        let elapsed = started.elapsed().as_secs_f64();
        self.summary.tests += 1;

        let (line, status, record) = match outcome {
            Ok(()) => (call_line, "PASS".to_string(), TestRecord::pass(name)),
            Err(Abort::Fail { line, message }) => {
                self.summary.failures += 1;
                (
                    line,
                    format!("FAIL: {}", message),
                    TestRecord::fail(name, message),
                )
            }
            Err(Abort::Ignore { line, message }) => {
                self.summary.ignored += 1;
                let status = match message {
                    Some(ref m) => format!("IGNORE: {}", m),
                    None => "IGNORE".to_string(),
                };
                (line, status, TestRecord::skip(name, message))
            }
        };

        writeln!(self.out, "{}:{}:{}:{}", self.file, line, name, status)?;
        self.out.flush()?;
        self.records.push(record.with_duration(elapsed));
        Ok(())
    }

    pub fn summary(&self) -> UnitySummary {
        self.summary
    }

    /// Print the closing summary and verdict.
    pub fn end(mut self) -> io::Result<SessionReport> {
        let summary = self.summary;
        writeln!(self.out)?;
        writeln!(self.out, "-----------------------")?;
        writeln!(
            self.out,
            "{} Tests {} Failures {} Ignored",
            summary.tests, summary.failures, summary.ignored
        )?;
        writeln!(self.out, "{}", if summary.passed() { "OK" } else { "FAIL" })?;
        self.out.flush()?;

        Ok(SessionReport {
            summary,
            records: self.records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::parse_output;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Counting {
        set_ups: u32,
        tear_downs: u32,
    }

    impl Fixture for Counting {
        fn set_up(&mut self) {
            self.set_ups += 1;
        }

        fn tear_down(&mut self) {
            self.tear_downs += 1;
        }
    }

    #[test]
    fn test_session_output_and_summary() {
        let mut out = Vec::new();
        let mut fixture = Counting::default();

        let mut session = UnitySession::begin("test/demo.rs", &mut out);
        session.run_test(&mut fixture, "test_ok", |_| Ok(())).unwrap();
        let fail_line = line!() + 1;
        session.run_test(&mut fixture, "test_bad", |_| assert_equal(1, 2)).unwrap();
        session.run_test(&mut fixture, "test_skip", |_| ignore(None)).unwrap();
        let report = session.end().unwrap();

        assert_eq!(fixture.set_ups, 3);
        assert_eq!(fixture.tear_downs, 3);
        assert_eq!(
            report.summary,
            UnitySummary {
                tests: 3,
                failures: 1,
                ignored: 1
            }
        );
        assert!(!report.passed());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("test/demo.rs:") && lines[0].ends_with(":test_ok:PASS"));
        assert_eq!(
            lines[1],
            format!("test/demo.rs:{}:test_bad:FAIL: Expected 1 Was 2", fail_line)
        );
        assert!(lines[2].ends_with(":test_skip:IGNORE"));
        assert_eq!(&lines[3..], &["", "-----------------------", "3 Tests 1 Failures 1 Ignored", "FAIL"]);
    }

    #[test]
    fn test_output_parses_back() {
        let mut out = Vec::new();
        let mut fixture = Counting::default();
        let mut session = UnitySession::begin("t.rs", &mut out);
        session.run_test(&mut fixture, "test_a", |_| Ok(())).unwrap();
        session
            .run_test(&mut fixture, "test_b", |_| assert_equal_hex8(0xAA, 0xAB))
            .unwrap();
        let report = session.end().unwrap();

        let parsed = parse_output(&String::from_utf8(out).unwrap());
        assert_eq!(parsed.summary, Some(report.summary));
        assert_eq!(parsed.verdict, Some(false));
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].error.as_deref(), Some("Expected 0xAA Was 0xAB"));
    }
}
