//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verilog simulation configuration
    pub sim: SimConfig,
    /// Hardware test configuration
    pub hw: HwConfig,
    /// Serial console configuration
    pub serial: SerialConfig,
    /// Report generation configuration
    pub report: ReportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Verilog language standard passed to `iverilog -g`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum VerilogStandard {
    #[serde(rename = "2001")]
    #[value(name = "2001")]
    V2001,
    #[serde(rename = "2005")]
    #[value(name = "2005")]
    V2005,
    #[serde(rename = "2009")]
    #[value(name = "2009")]
    V2009,
    #[serde(rename = "2012")]
    #[value(name = "2012")]
    V2012,
}

impl VerilogStandard {
    /// The year suffix used in the `-g` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2001 => "2001",
            Self::V2005 => "2005",
            Self::V2009 => "2009",
            Self::V2012 => "2012",
        }
    }
}

impl Default for VerilogStandard {
    fn default() -> Self {
        Self::V2012
    }
}

/// Simulation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Directory holding the testbenches, relative to the project root
    pub dir: PathBuf,
    /// Glob used to discover testbenches inside `dir`
    pub testbench_pattern: String,
    /// Verilog standard
    pub standard: VerilogStandard,
    /// Default compiled output for single runs
    pub output: PathBuf,
    /// Extra include directories
    pub include_dirs: Vec<PathBuf>,
    /// Compiler executable
    pub iverilog: String,
    /// Simulator executable
    pub vvp: String,
    /// Explicit OSS CAD Suite location (Windows)
    pub oss_cad_suite: Option<PathBuf>,
    /// Per-process timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("tests/sim"),
            testbench_pattern: "tb_*.v".to_string(),
            standard: VerilogStandard::default(),
            output: PathBuf::from("sim.vvp"),
            include_dirs: Vec::new(),
            iverilog: "iverilog".to_string(),
            vvp: "vvp".to_string(),
            oss_cad_suite: None,
            timeout_secs: 300,
        }
    }
}

impl SimConfig {
    /// Get the process timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Hardware test section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HwConfig {
    /// Directory holding the PlatformIO test project
    pub dir: PathBuf,
    /// PlatformIO environment
    pub env: String,
    /// PlatformIO executable
    pub pio: String,
    /// Timeout for a complete build/upload/test cycle, in seconds
    pub timeout_secs: u64,
    /// Delay before the on-target template starts, in milliseconds
    pub boot_delay_ms: u32,
}

impl Default for HwConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("tests/hw"),
            env: "esp32".to_string(),
            pio: "pio".to_string(),
            timeout_secs: 600,
            boot_delay_ms: 2000,
        }
    }
}

impl HwConfig {
    /// Get the run timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Serial console section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Console port (or an alias)
    pub port: Option<String>,
    /// Baud rate of the board's console
    pub baud: u32,
    /// Per-read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// How long to wait for a complete Unity run, in seconds
    pub capture_timeout_secs: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 115200,
            read_timeout_ms: 100,
            capture_timeout_secs: 60,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the per-read timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Get the capture timeout as Duration
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::Markdown
    }
}

/// Report section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Default report format
    pub format: ReportFormat,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Compact
    }
}
