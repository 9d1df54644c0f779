//! Capturing a Unity run from a board's serial console.
//!
//! The on-target template prints one Unity line per test followed by
//!
//! ```text
//! -----------------------
//! 5 Tests 0 Failures 0 Ignored
//! OK
//! ```
//!
//! The capture reads lines until that summary and its verdict have arrived,
//! or until the deadline passes.

use crate::port::{ConsolePort, PortError};
use crate::results::{parse_line, OutputLine, SuiteResults, TestRecord, UnitySummary};
use memchr::memchr;
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What was seen on the console.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub lines: Vec<String>,
    pub records: Vec<TestRecord>,
    pub summary: Option<UnitySummary>,
    pub verdict: Option<bool>,
    /// The summary arrived before the deadline.
    pub complete: bool,
    pub elapsed: Duration,
}

impl Capture {
    /// Complete, no failures, and every counted test was seen.
    pub fn passed(&self) -> bool {
        match self.summary {
            Some(summary) if self.complete => {
                summary.passed()
                    && self.verdict != Some(false)
                    && self.records.iter().all(|r| r.passed)
            }
            _ => false,
        }
    }

    pub fn into_results(self, port_name: &str) -> SuiteResults {
        let mut results = SuiteResults::new("hardware");
        results
            .extra
            .insert("port".to_string(), port_name.to_string().into());
        for record in self.records {
            results.push(record);
        }
        if !self.complete {
            results.push(TestRecord::fail(
                "unity_summary",
                format!(
                    "Timed out after {:.1}s waiting for the Unity summary",
                    self.elapsed.as_secs_f64()
                ),
            ));
        }
        results
    }

    fn accept(&mut self, line: String, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "{}", line)?;
        trace!(%line, "console");
        match parse_line(&line) {
            Some(OutputLine::Record(record)) => {
                debug!(test = %record.name, passed = record.passed, "test result");
                self.records.push(record);
            }
            Some(OutputLine::Summary(summary)) => self.summary = Some(summary),
            Some(OutputLine::Verdict(ok)) if self.summary.is_some() => self.verdict = Some(ok),
            _ => {}
        }
        self.lines.push(line);
        Ok(())
    }
}

fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = memchr(b'\n', pending)?;
    let raw: Vec<u8> = pending.drain(..=pos).collect();
    Some(
        String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string(),
    )
}

/// Read `port` until a full Unity run has been seen or `timeout` elapses.
/// Each console line is echoed to `out`.
pub fn capture_unity_run<P: ConsolePort + ?Sized>(
    port: &mut P,
    timeout: Duration,
    out: &mut dyn Write,
) -> Result<Capture, MonitorError> {
    let started = Instant::now();
    let deadline = started + timeout;
    let mut capture = Capture::default();
    let mut pending: Vec<u8> = Vec::new();
    let mut buffer = [0u8; 1024];

    debug!(port = port.name(), ?timeout, "waiting for Unity output");

    while Instant::now() < deadline {
        match port.read_bytes(&mut buffer) {
            Ok(0) => {}
            Ok(n) => {
                pending.extend_from_slice(&buffer[..n]);
                while let Some(line) = take_line(&mut pending) {
                    capture.accept(line, out)?;
                }
            }
            Err(e) if e.is_idle() => {
                // The verdict may arrive without a trailing newline.
                if capture.summary.is_some() && capture.verdict.is_none() && !pending.is_empty() {
                    let rest = String::from_utf8_lossy(&pending).trim().to_string();
                    pending.clear();
                    capture.accept(rest, out)?;
                }
                if capture.summary.is_some() {
                    capture.complete = true;
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }

        if capture.summary.is_some() && capture.verdict.is_some() {
            capture.complete = true;
            break;
        }
    }

    capture.elapsed = started.elapsed();
    out.flush()?;
    Ok(capture)
}
