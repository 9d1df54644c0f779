//! Icarus Verilog simulation runs.
//!
//! A single run compiles sources with `iverilog` and executes the result
//! with `vvp`. A suite run discovers every testbench matching the configured
//! pattern (`tb_*.v`), runs each in the suite directory and collects a
//! [`TestRecord`] per bench. A bench passes when both steps exit with 0.

use crate::config::{SimConfig, VerilogStandard};
use crate::process::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};
use crate::results::{SuiteResults, TestRecord};
use crate::toolchain::Toolchain;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub(crate) const RULE: &str =
    "============================================================";

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{tool} not found. Make sure Icarus Verilog or OSS CAD Suite is installed.")]
    ToolNotFound { tool: String },

    #[error("Compilation failed")]
    CompileFailed { stdout: String, stderr: String },

    #[error("Simulation failed with exit code {}", exit_code(.code))]
    SimulationFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error(transparent)]
    Process(ProcessError),

    #[error("Invalid testbench pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (killed by signal)".to_string())
}

impl SimError {
    fn from_process(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound { program } => Self::ToolNotFound { tool: program },
            other => Self::Process(other),
        }
    }

    /// Text recorded as a failed test's error.
    pub fn details(&self) -> String {
        match self {
            Self::CompileFailed { stdout, stderr } => {
                let output = [stdout.trim(), stderr.trim()]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                if output.is_empty() {
                    "Compilation failed".to_string()
                } else {
                    format!("Compilation failed:\n{}", output)
                }
            }
            Self::SimulationFailed { stderr, .. } if !stderr.trim().is_empty() => {
                format!("{}\n{}", self, stderr.trim())
            }
            other => other.to_string(),
        }
    }
}

/// Everything needed to compile one design.
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub standard: VerilogStandard,
    pub cwd: Option<PathBuf>,
}

/// Drives `iverilog` and `vvp` through a [`ProcessRunner`].
pub struct SimRunner<'a> {
    runner: &'a dyn ProcessRunner,
    toolchain: Toolchain,
    config: SimConfig,
}

impl<'a> SimRunner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, toolchain: Toolchain, config: SimConfig) -> Self {
        Self {
            runner,
            toolchain,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn compile_command(&self, job: &CompileJob) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.config.iverilog)
            .arg(format!("-g{}", job.standard.as_str()))
            .arg("-o")
            .arg(job.output.display().to_string());
        for dir in &job.include_dirs {
            cmd = cmd.arg("-I").arg(dir.display().to_string());
        }
        cmd = cmd.args(job.sources.iter().map(|s| s.display().to_string()));
        if let Some(ref cwd) = job.cwd {
            cmd = cmd.current_dir(cwd);
        }
        cmd
    }

    /// Compile `job`, reporting progress to `out`.
    pub async fn compile(
        &self,
        job: &CompileJob,
        out: &mut dyn Write,
    ) -> Result<ProcessOutput, SimError> {
        let cmd = self.compile_command(job);
        writeln!(out, "Compiling: {}", cmd.display())?;

        let result = self
            .runner
            .run(&self.toolchain.wrap(cmd), self.config.timeout())
            .await;
        let output = match result {
            Ok(output) => output,
            Err(ProcessError::NotFound { program }) => {
                writeln!(out, "[ERROR] {} not found!", program)?;
                writeln!(
                    out,
                    "        Make sure Icarus Verilog or OSS CAD Suite is installed."
                )?;
                return Err(SimError::ToolNotFound { tool: program });
            }
            Err(err) => {
                writeln!(out, "[ERROR] {}", err)?;
                return Err(SimError::from_process(err));
            }
        };

        write_captured(out, &output)?;
        if output.success() {
            writeln!(out, "[PASS] Compilation successful: {}", job.output.display())?;
            Ok(output)
        } else {
            writeln!(out, "[FAIL] Compilation failed!")?;
            Err(SimError::CompileFailed {
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }

    /// Run a compiled simulation, reporting progress to `out`.
    pub async fn simulate(
        &self,
        vvp_file: &Path,
        cwd: Option<&Path>,
        out: &mut dyn Write,
    ) -> Result<ProcessOutput, SimError> {
        let mut cmd = CommandSpec::new(&self.config.vvp).arg(vvp_file.display().to_string());
        if let Some(cwd) = cwd {
            cmd = cmd.current_dir(cwd);
        }

        writeln!(out, "Running simulation: {}", cmd.display())?;
        writeln!(out, "{}", RULE)?;

        let result = self
            .runner
            .run(&self.toolchain.wrap(cmd), self.config.timeout())
            .await;
        let output = match result {
            Ok(output) => output,
            Err(ProcessError::NotFound { program }) => {
                writeln!(out, "{}", RULE)?;
                writeln!(out, "[ERROR] {} not found!", program)?;
                writeln!(
                    out,
                    "   Make sure Icarus Verilog or OSS CAD Suite is installed."
                )?;
                return Err(SimError::ToolNotFound { tool: program });
            }
            Err(err) => {
                writeln!(out, "{}", RULE)?;
                writeln!(out, "[FAIL] {}", err)?;
                return Err(SimError::from_process(err));
            }
        };

        write_captured(out, &output)?;
        writeln!(out, "{}", RULE)?;
        if output.success() {
            writeln!(out, "[PASS] Simulation complete")?;
            Ok(output)
        } else {
            writeln!(
                out,
                "[FAIL] Simulation failed with exit code {}",
                exit_code(&output.code)
            )?;
            Err(SimError::SimulationFailed {
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }

    /// Compile and run one design; the `sim` command.
    pub async fn run(
        &self,
        job: &CompileJob,
        compile_only: bool,
        out: &mut dyn Write,
    ) -> Result<(), SimError> {
        self.compile(job, out).await?;
        if !compile_only {
            self.simulate(&job.output, job.cwd.as_deref(), out).await?;
        }
        Ok(())
    }

    /// Compile and run one testbench found in `dir`.
    pub async fn run_testbench(
        &self,
        dir: &Path,
        testbench: &Path,
        out: &mut dyn Write,
    ) -> Result<TestRecord, SimError> {
        let name = testbench.display().to_string();
        writeln!(out)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "Running: {}", name)?;
        writeln!(out, "{}", RULE)?;

        let job = CompileJob {
            sources: vec![testbench.to_path_buf()],
            output: testbench.with_extension("vvp"),
            include_dirs: self.config.include_dirs.clone(),
            standard: self.config.standard,
            cwd: Some(dir.to_path_buf()),
        };

        let mut elapsed = 0.0;
        let outcome = match self.compile(&job, out).await {
            Ok(compiled) => {
                elapsed += compiled.elapsed.as_secs_f64();
                self.simulate(&job.output, Some(dir), out).await
            }
            Err(err) => Err(err),
        };

        let record = match outcome {
            Ok(ran) => TestRecord::pass(&name).with_duration(elapsed + ran.elapsed.as_secs_f64()),
            // Our own output failed; nothing further can be reported.
            Err(err @ SimError::Io(_)) => return Err(err),
            Err(err) => TestRecord::fail(&name, err.details()).with_duration(elapsed),
        };
        debug!(testbench = %name, passed = record.passed, "testbench finished");
        Ok(record)
    }

    /// Run every testbench in `dir`; the `sim-all` command and the regression
    /// simulation stage.
    pub async fn run_suite(&self, dir: &Path, out: &mut dyn Write) -> Result<SuiteResults, SimError> {
        writeln!(out, "{}", RULE)?;
        writeln!(out, "FPGA Testkit - Simulation Test Runner")?;
        writeln!(out, "{}", RULE)?;

        let mut results = SuiteResults::new("simulation");
        let testbenches = discover_testbenches(dir, &self.config.testbench_pattern)?;
        if testbenches.is_empty() {
            writeln!(
                out,
                "No testbenches found (no {} files)",
                self.config.testbench_pattern
            )?;
            return Ok(results);
        }

        writeln!(out)?;
        writeln!(out, "Found {} testbench(es):", testbenches.len())?;
        for tb in &testbenches {
            writeln!(out, "  - {}", tb.display())?;
        }
        info!(count = testbenches.len(), dir = %dir.display(), "running simulation suite");

        for tb in &testbenches {
            let record = self.run_testbench(dir, tb, out).await?;
            results.push(record);
        }

        writeln!(out)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "Test Summary")?;
        writeln!(out, "{}", RULE)?;
        for record in results.records() {
            let status = if record.passed { "[PASS]" } else { "[FAIL]" };
            writeln!(out, "{}: {}", status, record.name)?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Total: {} | Passed: {} | Failed: {}",
            results.total(),
            results.passed(),
            results.failed()
        )?;
        writeln!(out)?;
        if results.failed() == 0 {
            writeln!(out, "*** All simulation tests passed! ***")?;
        } else {
            writeln!(out, "*** {} test(s) failed! ***", results.failed())?;
        }

        Ok(results)
    }
}

fn write_captured(out: &mut dyn Write, output: &ProcessOutput) -> std::io::Result<()> {
    for text in [&output.stdout, &output.stderr] {
        if !text.trim().is_empty() {
            writeln!(out, "{}", text.trim_end())?;
        }
    }
    Ok(())
}

/// Testbenches in `dir` matching `pattern`, sorted, relative to `dir`.
pub fn discover_testbenches(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, SimError> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );

    let mut found: Vec<PathBuf> = glob::glob(&full)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .filter_map(|p| p.strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["tb_uart.v", "tb_counter.v", "counter.v", "tb_notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("tb_dir.v")).unwrap();

        let found = discover_testbenches(dir.path(), "tb_*.v").unwrap();
        assert_eq!(
            found,
            vec![PathBuf::from("tb_counter.v"), PathBuf::from("tb_uart.v")]
        );
    }

    #[test]
    fn test_discovery_in_missing_dir_is_empty() {
        let found = discover_testbenches(Path::new("/nonexistent/sim/dir"), "tb_*.v").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_details_include_compiler_output() {
        let err = SimError::CompileFailed {
            stdout: String::new(),
            stderr: "tb_uart.v:12: syntax error\n".to_string(),
        };
        assert_eq!(err.details(), "Compilation failed:\ntb_uart.v:12: syntax error");

        let err = SimError::SimulationFailed {
            code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.details(), "Simulation failed with exit code 1");
    }
}
