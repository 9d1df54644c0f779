//! Locating the Icarus Verilog toolchain.
//!
//! On Windows the tools usually come from an OSS CAD Suite install whose
//! `environment.bat` has to be sourced before `iverilog`/`vvp` will run. On
//! Linux and macOS the tools are expected on `PATH`.

use crate::config::SimConfig;
use crate::process::CommandSpec;
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SUITE_DIR_NAME: &str = "oss-cad-suite";
const ENVIRONMENT_BAT: &str = "environment.bat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl HostPlatform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }
}

/// Resolved toolchain environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub platform: HostPlatform,
    /// OSS CAD Suite root, only ever set on Windows.
    pub oss_cad_suite: Option<PathBuf>,
}

impl Toolchain {
    /// Inspect the host and report what was found.
    pub fn detect(config: &SimConfig) -> Self {
        Self::detect_on(HostPlatform::current(), config)
    }

    pub fn detect_on(platform: HostPlatform, config: &SimConfig) -> Self {
        match platform {
            HostPlatform::Windows => {
                let found = oss_cad_candidates(config)
                    .into_iter()
                    .find(|candidate| candidate.exists());
                match found {
                    Some(ref path) => info!("Using OSS CAD Suite from: {}", path.display()),
                    None => {
                        warn!("OSS CAD Suite not found in standard locations, assuming {} is in PATH", config.iverilog);
                        warn!("If simulation fails, install OSS CAD Suite: https://github.com/YosysHQ/oss-cad-suite-build");
                    }
                }
                Self {
                    platform,
                    oss_cad_suite: found,
                }
            }
            HostPlatform::Linux | HostPlatform::MacOs => {
                match find_in_path(&config.iverilog) {
                    Some(path) => info!("Using {} from: {}", config.iverilog, path.display()),
                    None => warn!(
                        "{} not found in PATH. Install Icarus Verilog or OSS CAD Suite.",
                        config.iverilog
                    ),
                }
                Self {
                    platform,
                    oss_cad_suite: None,
                }
            }
            HostPlatform::Other => {
                warn!("Unsupported platform: {}", std::env::consts::OS);
                Self {
                    platform,
                    oss_cad_suite: None,
                }
            }
        }
    }

    /// The suite's `environment.bat`, if this toolchain has one on disk.
    pub fn environment_script(&self) -> Option<PathBuf> {
        if self.platform != HostPlatform::Windows {
            return None;
        }
        self.oss_cad_suite
            .as_ref()
            .map(|root| root.join(ENVIRONMENT_BAT))
            .filter(|bat| bat.exists())
    }

    /// Prepare `command` for this environment. On Windows with a suite the
    /// tool runs as `cmd /c "call environment.bat && <command>"`.
    pub fn wrap(&self, command: CommandSpec) -> CommandSpec {
        match self.environment_script() {
            Some(bat) => {
                let mut wrapped = CommandSpec::new("cmd").args([
                    "/c".to_string(),
                    format!("call {} && {}", bat.display(), command.display()),
                ]);
                wrapped.cwd = command.cwd;
                wrapped
            }
            None => command,
        }
    }
}

/// Places an OSS CAD Suite is looked for, most specific first.
fn oss_cad_candidates(config: &SimConfig) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(ref explicit) = config.oss_cad_suite {
        candidates.push(explicit.clone());
    }
    candidates.push(PathBuf::from(r"C:\").join(SUITE_DIR_NAME));
    candidates.push(PathBuf::from(r"C:\Program Files").join(SUITE_DIR_NAME));
    if let Some(dirs) = BaseDirs::new() {
        candidates.push(dirs.home_dir().join(SUITE_DIR_NAME));
    }
    candidates
}

/// Look `program` up on `PATH`.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    let extensions: Vec<String> = if cfg!(windows) {
        std::env::var("PATHEXT")
            .unwrap_or_else(|_| ".EXE;.BAT;.CMD".to_string())
            .split(';')
            .map(str::to_string)
            .collect()
    } else {
        vec![String::new()]
    };

    std::env::split_paths(&path).find_map(|dir| {
        extensions
            .iter()
            .map(|ext| dir.join(format!("{}{}", program, ext)))
            .find(|candidate| candidate.is_file())
    })
}
