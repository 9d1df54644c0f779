use crate::config::ConfigError;
use crate::hw::HwError;
use crate::monitor::MonitorError;
use crate::port::PortError;
use crate::regress::RegressError;
use crate::report::ReportError;
use crate::results::ResultsError;
use crate::sim::SimError;
use crate::vcd::VcdError;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

/// Top-level error for the command line tool. Each subsystem keeps its own
/// error type; this one only exists so `main` can use `?` across all of them.
#[derive(Debug)]
pub enum AppError {
    InvalidArgument(String),
    Config(ConfigError),
    Vcd(VcdError),
    Sim(SimError),
    Hw(HwError),
    Port(PortError),
    Monitor(MonitorError),
    Results(ResultsError),
    Report(ReportError),
    Regress(RegressError),
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(details) => write!(f, "Invalid argument: {details}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            // VCD errors already read as user-facing messages.
            Self::Vcd(e) => write!(f, "{e}"),
            Self::Sim(e) => write!(f, "Simulation error: {e}"),
            Self::Hw(e) => write!(f, "Hardware test error: {e}"),
            Self::Port(e) => write!(f, "A serial port error occurred: {e}"),
            Self::Monitor(e) => write!(f, "Console capture failed: {e}"),
            Self::Results(e) => write!(f, "{e}"),
            Self::Report(e) => write!(f, "{e}"),
            Self::Regress(e) => write!(f, "Regression run failed: {e}"),
            Self::IoError(e) => write!(f, "An I/O error occurred: {e}"),
            Self::SerdeError(e) => write!(f, "A serialization/deserialization error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidArgument(_) => None,
            Self::Config(e) => Some(e),
            Self::Vcd(e) => Some(e),
            Self::Sim(e) => Some(e),
            Self::Hw(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Monitor(e) => Some(e),
            Self::Results(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Regress(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::SerdeError(e) => Some(e),
        }
    }
}

// `From` conversions so `?` works across subsystems.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<VcdError> for AppError {
    fn from(err: VcdError) -> Self {
        AppError::Vcd(err)
    }
}

impl From<SimError> for AppError {
    fn from(err: SimError) -> Self {
        AppError::Sim(err)
    }
}

impl From<HwError> for AppError {
    fn from(err: HwError) -> Self {
        AppError::Hw(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<MonitorError> for AppError {
    fn from(err: MonitorError) -> Self {
        AppError::Monitor(err)
    }
}

impl From<ResultsError> for AppError {
    fn from(err: ResultsError) -> Self {
        AppError::Results(err)
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::Report(err)
    }
}

impl From<RegressError> for AppError {
    fn from(err: RegressError) -> Self {
        AppError::Regress(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcd_not_found_reads_plainly() {
        let err: AppError = VcdError::NotFound("missing.vcd".into()).into();
        assert_eq!(err.to_string(), "File not found: missing.vcd");
    }

    #[test]
    fn test_io_errors_convert() {
        fn fails() -> AppResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
        assert_eq!(err.to_string(), "An I/O error occurred: disk full");
    }
}
