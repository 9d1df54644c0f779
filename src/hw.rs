//! Hardware-in-the-loop runs through PlatformIO.
//!
//! `pio test -e <env>` builds the Unity test firmware, uploads it and relays
//! the board's results. The run passes when `pio` exits with 0. Individual
//! test outcomes are recovered from its output.

use crate::config::HwConfig;
use crate::process::{CommandSpec, ProcessError, ProcessRunner};
use crate::results::{parse_output, SuiteResults, TestRecord, UnitySummary};
use crate::sim::RULE;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HwError {
    #[error("PlatformIO CLI ({tool}) not found. Install PlatformIO: https://platformio.org/install")]
    ToolNotFound { tool: String },

    #[error(transparent)]
    Process(ProcessError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one `pio test` invocation.
#[derive(Debug, Clone)]
pub struct HwOutcome {
    pub results: SuiteResults,
    pub summary: Option<UnitySummary>,
    pub exit_code: Option<i32>,
}

impl HwOutcome {
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0)
    }
}

fn exit_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub struct HwRunner<'a> {
    runner: &'a dyn ProcessRunner,
    config: HwConfig,
}

impl<'a> HwRunner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: HwConfig) -> Self {
        Self { runner, config }
    }

    pub fn command(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.config.pio)
            .args(["test", "-e", self.config.env.as_str()])
            .current_dir(dir)
    }

    /// Build, upload and run the hardware tests in `dir`.
    pub async fn run(&self, dir: &Path, out: &mut dyn Write) -> Result<HwOutcome, HwError> {
        writeln!(out, "{}", RULE)?;
        writeln!(out, "Hardware Tests ({})", self.config.env)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        writeln!(out, "Building and uploading tests...")?;

        let cmd = self.command(dir);
        info!(command = %cmd.display(), dir = %dir.display(), "running hardware tests");

        let output = match self.runner.run(&cmd, self.config.timeout()).await {
            Ok(output) => output,
            Err(ProcessError::NotFound { program }) => {
                writeln!(out, "[ERROR] PlatformIO CLI ({}) not found!", program)?;
                writeln!(out, "   Install PlatformIO: https://platformio.org/install")?;
                return Err(HwError::ToolNotFound { tool: program });
            }
            Err(err) => {
                writeln!(out, "[FAIL] {}", err)?;
                return Err(HwError::Process(err));
            }
        };

        for text in [&output.stdout, &output.stderr] {
            if !text.trim().is_empty() {
                writeln!(out, "{}", text.trim_end())?;
            }
        }

        let mut parsed = parse_output(&output.stdout);
        let from_stderr = parse_output(&output.stderr);
        parsed.records.extend(from_stderr.records);
        let summary = parsed.summary.or(from_stderr.summary);

        let mut results = SuiteResults::new("hardware");
        results
            .extra
            .insert("env".to_string(), self.config.env.clone().into());

        let elapsed = output.elapsed.as_secs_f64();
        if parsed.records.is_empty() {
            // Nothing recognisable in the output: record the run as a whole.
            let name = format!("pio test -e {}", self.config.env);
            let record = if output.success() {
                TestRecord::pass(name)
            } else {
                warn!("no test results found in PlatformIO output");
                let tail: Vec<&str> = output.stdout.lines().rev().take(20).collect();
                let tail: Vec<&str> = tail.into_iter().rev().collect();
                TestRecord::fail(
                    name,
                    format!("exit code {}\n{}", exit_code(output.code), tail.join("\n")),
                )
            };
            results.push(record.with_duration(elapsed));
        } else {
            for record in parsed.records {
                results.push(record);
            }
        }

        let outcome = HwOutcome {
            results,
            summary,
            exit_code: output.code,
        };

        writeln!(out)?;
        if outcome.passed() {
            writeln!(out, "[PASS] Hardware tests PASSED")?;
        } else {
            writeln!(
                out,
                "[FAIL] Hardware tests FAILED (exit code {})",
                exit_code(output.code)
            )?;
        }
        Ok(outcome)
    }
}
