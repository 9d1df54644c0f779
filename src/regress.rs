//! Regression runs: the simulation suite, then the hardware suite.

use crate::config::Config;
use crate::hw::HwRunner;
use crate::process::ProcessRunner;
use crate::report::{ReportError, TestReport};
use crate::results::{ResultsError, SuiteResults};
use crate::sim::{SimRunner, RULE};
use crate::toolchain::Toolchain;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RegressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Clone)]
pub struct RegressOptions {
    /// Library root; suite directories are resolved against it.
    pub root: PathBuf,
    pub run_sim: bool,
    pub run_hw: bool,
    pub verbose: bool,
    pub results_dir: Option<PathBuf>,
}

impl Default for RegressOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            run_sim: true,
            run_hw: true,
            verbose: false,
            results_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub name: &'static str,
    pub passed: bool,
    /// `None` when the suite did not run.
    pub results: Option<SuiteResults>,
}

#[derive(Debug, Clone, Default)]
pub struct RegressOutcome {
    pub stages: Vec<StageOutcome>,
}

impl RegressOutcome {
    pub fn passed(&self) -> bool {
        self.stages.iter().all(|s| s.passed)
    }

    fn results(&self, name: &str) -> Option<SuiteResults> {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.results.clone())
    }
}

pub struct Regression<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a Config,
}

fn banner(out: &mut dyn Write, title: &str) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", RULE)
}

/// Replay output that was held back because the stage failed.
fn replay(out: &mut dyn Write, captured: &[u8]) -> std::io::Result<()> {
    if !captured.is_empty() {
        out.write_all(captured)?;
        if !captured.ends_with(b"\n") {
            writeln!(out)?;
        }
    }
    Ok(())
}

impl<'a> Regression<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    pub async fn run(
        &self,
        options: &RegressOptions,
        out: &mut dyn Write,
    ) -> Result<RegressOutcome, RegressError> {
        let mut outcome = RegressOutcome::default();

        if options.run_sim {
            outcome.stages.push(self.sim_stage(options, out).await?);
        }
        if options.run_hw {
            outcome.stages.push(self.hw_stage(options, out).await?);
        }

        banner(out, "Test Summary")?;
        for stage in &outcome.stages {
            let (symbol, status) = if stage.passed {
                ("[PASS]", "PASS")
            } else {
                ("[FAIL]", "FAIL")
            };
            writeln!(out, "{} {}: {}", symbol, stage.name, status)?;
        }
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        if outcome.passed() {
            writeln!(out, "*** All tests passed! ***")?;
        } else {
            writeln!(out, "*** Some tests failed! ***")?;
        }

        if let Some(ref dir) = options.results_dir {
            self.write_results(&outcome, dir)?;
            writeln!(out, "Results written to: {}", dir.display())?;
        }

        info!(passed = outcome.passed(), "regression finished");
        Ok(outcome)
    }

    async fn sim_stage(
        &self,
        options: &RegressOptions,
        out: &mut dyn Write,
    ) -> Result<StageOutcome, RegressError> {
        banner(out, "Running Simulation Tests")?;

        let dir = options.root.join(&self.config.sim.dir);
        if !dir.is_dir() {
            writeln!(
                out,
                "[WARN] No simulation tests found ({}/ does not exist)",
                self.config.sim.dir.display()
            )?;
            return Ok(StageOutcome {
                name: "Simulation",
                passed: true,
                results: None,
            });
        }

        let toolchain = Toolchain::detect(&self.config.sim);
        let sim = SimRunner::new(self.runner, toolchain, self.config.sim.clone());

        let mut captured = Vec::new();
        let result = {
            let sink: &mut dyn Write = if options.verbose {
                &mut *out
            } else {
                &mut captured
            };
            sim.run_suite(&dir, sink).await
        };

        let stage = match result {
            Ok(results) => {
                let passed = results.failed() == 0;
                if passed {
                    writeln!(out, "[PASS] Simulation tests PASSED")?;
                } else {
                    writeln!(out, "[FAIL] Simulation tests FAILED")?;
                    replay(out, &captured)?;
                }
                StageOutcome {
                    name: "Simulation",
                    passed,
                    results: Some(results),
                }
            }
            Err(e) => {
                replay(out, &captured)?;
                writeln!(out, "[ERROR] Error running simulation tests: {}", e)?;
                StageOutcome {
                    name: "Simulation",
                    passed: false,
                    results: None,
                }
            }
        };
        Ok(stage)
    }

    async fn hw_stage(
        &self,
        options: &RegressOptions,
        out: &mut dyn Write,
    ) -> Result<StageOutcome, RegressError> {
        banner(out, "Running Hardware Tests")?;

        let dir = options.root.join(&self.config.hw.dir);
        if !dir.is_dir() {
            writeln!(
                out,
                "[WARN] No hardware tests found ({}/ does not exist)",
                self.config.hw.dir.display()
            )?;
            return Ok(StageOutcome {
                name: "Hardware",
                passed: true,
                results: None,
            });
        }

        let hw = HwRunner::new(self.runner, self.config.hw.clone());

        let mut captured = Vec::new();
        let result = {
            let sink: &mut dyn Write = if options.verbose {
                &mut *out
            } else {
                &mut captured
            };
            hw.run(&dir, sink).await
        };

        let stage = match result {
            Ok(run) => {
                let passed = run.passed();
                if passed {
                    writeln!(out, "[PASS] Hardware tests PASSED")?;
                } else {
                    writeln!(out, "[FAIL] Hardware tests FAILED")?;
                    replay(out, &captured)?;
                }
                StageOutcome {
                    name: "Hardware",
                    passed,
                    results: Some(run.results),
                }
            }
            Err(e) => {
                replay(out, &captured)?;
                writeln!(out, "[ERROR] Error running hardware tests: {}", e)?;
                StageOutcome {
                    name: "Hardware",
                    passed: false,
                    results: None,
                }
            }
        };
        Ok(stage)
    }

    fn write_results(&self, outcome: &RegressOutcome, dir: &Path) -> Result<(), RegressError> {
        let sim = outcome.results("Simulation");
        let hw = outcome.results("Hardware");

        if let Some(ref results) = sim {
            results.save(dir.join("sim.json"))?;
        }
        if let Some(ref results) = hw {
            results.save(dir.join("hw.json"))?;
        }

        let report = TestReport::new().with_results(sim, hw);
        report.write_to(&dir.join("report.md"), &report.generate_markdown())?;
        Ok(())
    }
}
