//! Combined simulation + hardware test reports.

use crate::results::{SuiteResults, TestRecord};
use chrono::{DateTime, Local};
use serde_json::{json, Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counts shown in a report's summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSummary {
    pub sim_total: usize,
    pub sim_passed: usize,
    pub hw_total: usize,
    pub hw_passed: usize,
}

impl ReportSummary {
    pub fn total_tests(&self) -> usize {
        self.sim_total + self.hw_total
    }

    pub fn total_passed(&self) -> usize {
        self.sim_passed + self.hw_passed
    }

    pub fn total_failed(&self) -> usize {
        self.total_tests() - self.total_passed()
    }

    /// Percentage of passing tests, 0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        match self.total_tests() {
            0 => 0.0,
            total => 100.0 * self.total_passed() as f64 / total as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestReport {
    pub sim: SuiteResults,
    pub hw: SuiteResults,
    pub timestamp: DateTime<Local>,
}

impl Default for TestReport {
    fn default() -> Self {
        Self::new()
    }
}

impl TestReport {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    pub fn at(timestamp: DateTime<Local>) -> Self {
        Self {
            sim: SuiteResults::default(),
            hw: SuiteResults::default(),
            timestamp,
        }
    }

    pub fn with_results(mut self, sim: Option<SuiteResults>, hw: Option<SuiteResults>) -> Self {
        self.sim = sim.unwrap_or_default();
        self.hw = hw.unwrap_or_default();
        self
    }

    /// Load simulation results. A file that cannot be read leaves the section
    /// empty and prints a warning.
    pub fn load_sim_results(&mut self, path: impl AsRef<Path>) {
        match SuiteResults::load(path) {
            Ok(results) => self.sim = results,
            Err(e) => {
                warn!("could not load simulation results: {}", e);
                eprintln!("Warning: Could not load sim results: {}", e);
            }
        }
    }

    pub fn load_hw_results(&mut self, path: impl AsRef<Path>) {
        match SuiteResults::load(path) {
            Ok(results) => self.hw = results,
            Err(e) => {
                warn!("could not load hardware results: {}", e);
                eprintln!("Warning: Could not load hw results: {}", e);
            }
        }
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            sim_total: self.sim.total(),
            sim_passed: self.sim.passed(),
            hw_total: self.hw.total(),
            hw_passed: self.hw.passed(),
        }
    }

    pub fn generate_markdown(&self) -> String {
        let summary = self.summary();
        let mut lines: Vec<String> = vec![
            "# Test Report".to_string(),
            format!(
                "\n**Generated**: {}",
                self.timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
            String::new(),
            "## Summary".to_string(),
            String::new(),
            format!("- **Total Tests**: {}", summary.total_tests()),
            format!("- **Passed**: {}", summary.total_passed()),
            format!("- **Failed**: {}", summary.total_failed()),
            format!("- **Success Rate**: {:.1}%", summary.success_rate()),
            String::new(),
        ];

        for (title, suite) in [("Simulation Tests", &self.sim), ("Hardware Tests", &self.hw)] {
            if suite.is_empty() {
                continue;
            }
            lines.push(format!("## {}", title));
            lines.push(String::new());
            lines.push(format!(
                "**Total**: {} | **Passed**: {} | **Failed**: {}",
                suite.total(),
                suite.passed(),
                suite.failed()
            ));
            lines.push(String::new());

            if suite.total() > 0 {
                lines.push("| Test | Status | Duration |".to_string());
                lines.push("|------|--------|----------|".to_string());
                for test in suite.records() {
                    let status = if test.passed { "✅ PASS" } else { "❌ FAIL" };
                    lines.push(format!(
                        "| {} | {} | {:.3}s |",
                        test.name, status, test.duration
                    ));
                }
                lines.push(String::new());
            }
        }

        let failures: Vec<(&str, &TestRecord)> = self
            .sim
            .records()
            .iter()
            .map(|t| ("Simulation", t))
            .chain(self.hw.records().iter().map(|t| ("Hardware", t)))
            .filter(|(_, t)| !t.passed)
            .collect();

        if !failures.is_empty() {
            lines.push("## Failed Tests".to_string());
            lines.push(String::new());
            for (kind, test) in failures {
                lines.push(format!("### {}: {}", kind, test.name));
                lines.push("```".to_string());
                lines.push(
                    test.error
                        .clone()
                        .unwrap_or_else(|| "No error message".to_string()),
                );
                lines.push("```".to_string());
                lines.push(String::new());
            }
        }

        lines.join("\n")
    }

    pub fn to_json(&self) -> Value {
        let summary = self.summary();
        let raw = |suite: &SuiteResults| {
            if suite.is_empty() {
                Value::Object(Map::new())
            } else {
                suite.to_value()
            }
        };

        json!({
            "timestamp": self.timestamp.to_rfc3339(),
            "simulation": raw(&self.sim),
            "hardware": raw(&self.hw),
            "summary": {
                "sim_total": summary.sim_total,
                "sim_passed": summary.sim_passed,
                "hw_total": summary.hw_total,
                "hw_passed": summary.hw_passed,
                "total_tests": summary.total_tests(),
                "total_passed": summary.total_passed(),
                "total_failed": summary.total_failed(),
                "success_rate": summary.success_rate(),
            }
        })
    }

    pub fn generate_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    pub fn write_to(&self, path: &Path, content: &str) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
