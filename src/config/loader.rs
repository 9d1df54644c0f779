//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "FPGA_TESTKIT";

/// Config file name
const CONFIG_FILE_NAME: &str = "testkit.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "FPGA_TESTKIT_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `FPGA_TESTKIT_CONFIG` environment variable (explicit path)
    /// 2. `./testkit.toml` (current directory)
    /// 3. `testkit.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("No config file path set".to_string()))?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            validate(&config)?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return Some(path);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fpga-testkit").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|value| (name, value))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str, what: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse(name, format!("Invalid {}", what)))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `FPGA_TESTKIT_<SECTION>_<KEY>`
/// For example:
/// - `FPGA_TESTKIT_HW_ENV=native`
/// - `FPGA_TESTKIT_SERIAL_PORT=/dev/ttyUSB1`
/// - `FPGA_TESTKIT_SIM_TIMEOUT_SECS=60`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Simulation overrides
    if let Some((_, val)) = env_var("SIM_DIR") {
        config.sim.dir = PathBuf::from(val);
    }
    if let Some((_, val)) = env_var("SIM_IVERILOG") {
        config.sim.iverilog = val;
    }
    if let Some((_, val)) = env_var("SIM_VVP") {
        config.sim.vvp = val;
    }
    if let Some((_, val)) = env_var("SIM_OSS_CAD_SUITE") {
        config.sim.oss_cad_suite = Some(PathBuf::from(val));
    }
    if let Some((name, val)) = env_var("SIM_TIMEOUT_SECS") {
        config.sim.timeout_secs = parse_env(&name, &val, "timeout")?;
    }

    // Hardware overrides
    if let Some((_, val)) = env_var("HW_DIR") {
        config.hw.dir = PathBuf::from(val);
    }
    if let Some((_, val)) = env_var("HW_ENV") {
        config.hw.env = val;
    }
    if let Some((_, val)) = env_var("HW_PIO") {
        config.hw.pio = val;
    }
    if let Some((name, val)) = env_var("HW_TIMEOUT_SECS") {
        config.hw.timeout_secs = parse_env(&name, &val, "timeout")?;
    }

    // Serial overrides
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = parse_env(&name, &val, "baud rate")?;
    }
    if let Some((name, val)) = env_var("SERIAL_CAPTURE_TIMEOUT_SECS") {
        config.serial.capture_timeout_secs = parse_env(&name, &val, "timeout")?;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((name, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = match val.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => return Err(ConfigError::env_parse(name, "Expected json, pretty or compact")),
        };
    }

    Ok(())
}

/// Reject values that would make every run fail.
fn validate(config: &Config) -> ConfigResult<()> {
    if config.serial.baud == 0 {
        return Err(ConfigError::validation("serial.baud", "must be non-zero"));
    }
    if config.sim.timeout_secs == 0 {
        return Err(ConfigError::validation("sim.timeout_secs", "must be non-zero"));
    }
    if config.hw.timeout_secs == 0 {
        return Err(ConfigError::validation("hw.timeout_secs", "must be non-zero"));
    }
    if config.sim.testbench_pattern.trim().is_empty() {
        return Err(ConfigError::validation(
            "sim.testbench_pattern",
            "must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().hw.env, "esp32");
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("FPGA_TESTKIT_HW_ENV", "native");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().hw.env, "native");

        env::remove_var("FPGA_TESTKIT_HW_ENV");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        env::set_var("FPGA_TESTKIT_SERIAL_BAUD", "fast");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        env::remove_var("FPGA_TESTKIT_SERIAL_BAUD");
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().hw.env = "papilio".to_string();
        loader.save_to(&path).unwrap();

        let mut reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().hw.env, "papilio");

        std::fs::write(&path, "[hw]\nenv = \"native\"\n").unwrap();
        reloaded.reload().unwrap();
        assert_eq!(reloaded.config().hw.env, "native");
    }

    #[test]
    fn test_validation_rejects_zero_baud() {
        let mut config = Config::default();
        config.serial.baud = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
