//! Configuration module for fpga-testkit.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `FPGA_TESTKIT_CONFIG` environment variable (explicit path)
//! 2. `./testkit.toml` (current directory)
//! 3. `testkit.toml` in the platform config directory
//!    (`~/.config/fpga-testkit/` on Linux, `%APPDATA%\fpga-testkit\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Values can be overridden via environment variables following the
//! pattern `FPGA_TESTKIT_<SECTION>_<KEY>`:
//! - `FPGA_TESTKIT_HW_ENV=native`
//! - `FPGA_TESTKIT_SERIAL_PORT=/dev/ttyUSB1`
//! - `FPGA_TESTKIT_SIM_OSS_CAD_SUITE=D:\tools\oss-cad-suite`
//!
//! # Example
//!
//! ```rust,ignore
//! use fpga_testkit::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Testbenches: {}", config.sim.dir.display());
//! println!("PlatformIO env: {}", config.hw.env);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, HwConfig, LogFormat, LoggingConfig, ReportConfig, ReportFormat, SerialConfig,
    SimConfig, VerilogStandard,
};
