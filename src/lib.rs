//! FPGA Testkit Library
//!
//! Host-side tooling for FPGA library regression testing: Icarus Verilog
//! simulation suites, PlatformIO hardware-in-the-loop runs, waveform (VCD)
//! inspection and combined test reports.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Top-level error for the command line tool
//! - `process`: External tool invocation behind the `ProcessRunner` seam
//! - `toolchain`: Locating Icarus Verilog / OSS CAD Suite
//! - `sim`: Compile-and-run of testbenches, single or as a suite
//! - `hw`: PlatformIO hardware test runs
//! - `port`: Serial console access
//! - `monitor`: Capturing a Unity run from a board's console
//! - `unity`: Unity-compatible session, assertions and the HIL template
//! - `results`: Test records and runner output parsing
//! - `report`: Markdown/JSON reports
//! - `regress`: Simulation + hardware regression runs
//! - `vcd`: Value Change Dump parsing and filtering

pub mod config;
pub mod error;
pub mod hw;
pub mod monitor;
pub mod port;
pub mod process;
pub mod regress;
pub mod report;
pub mod results;
pub mod sim;
pub mod toolchain;
pub mod unity;
pub mod vcd;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use hw::{HwError, HwOutcome, HwRunner};
pub use monitor::{capture_unity_run, Capture, MonitorError};
pub use port::{ConsolePort, MockConsole, PortConfiguration, PortError, SerialConsole};
pub use process::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner, TokioRunner};
pub use regress::{RegressOptions, RegressOutcome, Regression};
pub use report::{ReportError, TestReport};
pub use results::{SuiteResults, TestRecord, UnitySummary};
pub use sim::{CompileJob, SimError, SimRunner};
pub use toolchain::Toolchain;
pub use vcd::{VcdError, VcdFile};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
