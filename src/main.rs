use clap::{Parser, Subcommand, ValueEnum};
use fpga_testkit::config::{
    Config, ConfigLoader, LogFormat, LoggingConfig, ReportFormat, VerilogStandard,
};
use fpga_testkit::error::{AppError, AppResult};
use fpga_testkit::hw::HwRunner;
use fpga_testkit::monitor::capture_unity_run;
use fpga_testkit::port::{list_ports, ConsolePort, PortConfiguration, SerialConsole};
use fpga_testkit::process::TokioRunner;
use fpga_testkit::regress::{RegressOptions, Regression};
use fpga_testkit::report::TestReport;
use fpga_testkit::results::SuiteResults;
use fpga_testkit::sim::{CompileJob, SimRunner};
use fpga_testkit::toolchain::Toolchain;
use fpga_testkit::unity::{template, HostBoard};
use fpga_testkit::vcd::{format_json, format_text, write_filtered, VcdError, VcdFile};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "fpga-testkit",
    version,
    about = "Regression tooling for FPGA libraries: simulation, hardware-in-the-loop, VCD analysis and reports."
)]
struct Cli {
    /// Configuration file (overrides FPGA_TESTKIT_CONFIG and ./testkit.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum VcdFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and analyse a VCD file
    Vcd {
        /// VCD file to parse
        file: PathBuf,
        /// Comma-separated list of signals to extract
        #[arg(long, value_delimiter = ',')]
        signals: Vec<String>,
        #[arg(long, value_enum, default_value_t = VcdFormat::Text)]
        format: VcdFormat,
        /// Write a filtered VCD for GTKWave instead of printing
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate a report from simulation and hardware results
    Report {
        /// Simulation results JSON file
        #[arg(long)]
        sim: Option<PathBuf>,
        /// Hardware results JSON file
        #[arg(long)]
        hw: Option<PathBuf>,
        /// Report format (default from config: markdown)
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile Verilog sources and run the simulation
    Sim {
        /// Verilog source files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Compiled output (default from config: sim.vvp)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include directory (repeatable)
        #[arg(short = 'I', long = "include")]
        include_dirs: Vec<PathBuf>,
        /// Verilog standard
        #[arg(long = "std", alias = "standard", value_enum)]
        standard: Option<VerilogStandard>,
        /// Compile only, do not run the simulation
        #[arg(long)]
        compile_only: bool,
    },

    /// Run every testbench in the simulation suite directory
    SimAll {
        /// Suite directory (default from config: tests/sim)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Write suite results JSON here
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Build, upload and run the hardware tests with PlatformIO
    Hw {
        /// PlatformIO project directory (default from config: tests/hw)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// PlatformIO environment (default from config: esp32)
        #[arg(short, long)]
        env: Option<String>,
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Capture a Unity run from a board's serial console
    Monitor {
        /// Serial port or alias (default from config)
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short, long)]
        baud: Option<u32>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// List serial ports
    Ports,

    /// Run the HIL template on this machine
    Selftest {
        /// Delay before the tests start (default from config: 2000)
        #[arg(long)]
        boot_delay_ms: Option<u32>,
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Run simulation and hardware regression tests
    Regress {
        /// Run simulation tests only
        #[arg(long, conflicts_with = "hw_only")]
        sim_only: bool,
        /// Run hardware tests only
        #[arg(long)]
        hw_only: bool,
        /// Show suite output even when it passes
        #[arg(short, long)]
        verbose: bool,
        /// Library root
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Write sim.json, hw.json and report.md here
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> AppResult<Config> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

/// Logs go to stderr so they never mix with report or VCD output.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: could not initialise logging: {}", e);
    }
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn save_results(results: &SuiteResults, path: Option<&Path>) -> AppResult<()> {
    if let Some(path) = path {
        results.save(path)?;
        eprintln!("Results written to: {}", path.display());
    }
    Ok(())
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);
    debug!(?config, "configuration loaded");

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            debug!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> AppResult<ExitCode> {
    match command {
        Command::Vcd {
            file,
            signals,
            format,
            output,
        } => vcd_command(&file, &signals, format, output.as_deref()),

        Command::Report {
            sim,
            hw,
            format,
            output,
        } => {
            let mut report = TestReport::new();
            if let Some(ref path) = sim {
                report.load_sim_results(path);
            }
            if let Some(ref path) = hw {
                report.load_hw_results(path);
            }

            let content = match format.unwrap_or(config.report.format) {
                ReportFormat::Json => report.generate_json()?,
                ReportFormat::Markdown => report.generate_markdown(),
            };
            match output {
                Some(ref path) => {
                    report.write_to(path, &content)?;
                    eprintln!("Report written to: {}", path.display());
                }
                None => println!("{}", content),
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Sim {
            sources,
            output,
            include_dirs,
            standard,
            compile_only,
        } => {
            let mut includes = include_dirs;
            includes.extend(config.sim.include_dirs.iter().cloned());
            let job = CompileJob {
                sources,
                output: output.unwrap_or_else(|| config.sim.output.clone()),
                include_dirs: includes,
                standard: standard.unwrap_or(config.sim.standard),
                cwd: None,
            };

            let toolchain = Toolchain::detect(&config.sim);
            let runner = TokioRunner;
            let sim = SimRunner::new(&runner, toolchain, config.sim.clone());
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match sim.run(&job, compile_only, &mut out).await {
                Ok(()) => Ok(ExitCode::SUCCESS),
                // The runner has already reported the failure.
                Err(e) => {
                    debug!(error = %e, "simulation failed");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::SimAll { dir, results } => {
            let dir = dir.unwrap_or_else(|| config.sim.dir.clone());
            let toolchain = Toolchain::detect(&config.sim);
            let runner = TokioRunner;
            let sim = SimRunner::new(&runner, toolchain, config.sim.clone());

            let suite = {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                sim.run_suite(&dir, &mut out).await?
            };
            save_results(&suite, results.as_deref())?;
            Ok(exit_code(suite.failed() == 0))
        }

        Command::Hw { dir, env, results } => {
            let mut hw_config = config.hw.clone();
            if let Some(env) = env {
                hw_config.env = env;
            }
            let dir = dir.unwrap_or_else(|| hw_config.dir.clone());
            let runner = TokioRunner;
            let hw = HwRunner::new(&runner, hw_config);

            let outcome = {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                hw.run(&dir, &mut out).await?
            };
            save_results(&outcome.results, results.as_deref())?;
            Ok(exit_code(outcome.passed()))
        }

        Command::Monitor {
            port,
            baud,
            timeout_secs,
            results,
        } => {
            let name = port.or_else(|| config.serial.port.clone()).ok_or_else(|| {
                AppError::InvalidArgument(
                    "no serial port given; pass --port or set serial.port in the config".into(),
                )
            })?;
            let port_name = config.serial.resolve_port(&name);
            let port_config = PortConfiguration::console(
                baud.unwrap_or(config.serial.baud),
                config.serial.read_timeout(),
            );
            let timeout = timeout_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.serial.capture_timeout());

            eprintln!("Listening on {} (timeout {}s)...", port_name, timeout.as_secs());
            let capture_port = port_name.clone();
            let capture = tokio::task::spawn_blocking(move || -> AppResult<_> {
                let mut console = SerialConsole::open(&capture_port, port_config)?;
                console.clear_input()?;
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                Ok(capture_unity_run(&mut console, timeout, &mut out)?)
            })
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

            let passed = capture.passed();
            if !capture.complete {
                eprintln!(
                    "[FAIL] No Unity summary within {}s",
                    timeout.as_secs()
                );
            } else if passed {
                println!("[PASS] Hardware tests PASSED");
            } else {
                println!("[FAIL] Hardware tests FAILED");
            }
            save_results(&capture.into_results(&port_name), results.as_deref())?;
            Ok(exit_code(passed))
        }

        Command::Ports => {
            let ports = list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
            }
            for p in ports {
                let details = [p.manufacturer, p.product]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{:<20} {:<18} {}", p.port_name, p.kind, details);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Selftest {
            boot_delay_ms,
            results,
        } => {
            let delay = boot_delay_ms.unwrap_or(config.hw.boot_delay_ms);
            let mut board = HostBoard::new(std::io::stdout());
            let report = template::setup(&mut board, std::io::stdout(), delay)?;
            let passed = report.passed();
            save_results(&report.into_results(), results.as_deref())?;
            Ok(exit_code(passed))
        }

        Command::Regress {
            sim_only,
            hw_only,
            verbose,
            root,
            results_dir,
        } => {
            let options = RegressOptions {
                root,
                run_sim: !hw_only,
                run_hw: !sim_only,
                verbose,
                results_dir,
            };
            let runner = TokioRunner;
            let regression = Regression::new(&runner, &config);

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let outcome = regression.run(&options, &mut out).await?;
            Ok(exit_code(outcome.passed()))
        }
    }
}

fn vcd_command(
    file: &Path,
    signals: &[String],
    format: VcdFormat,
    output: Option<&Path>,
) -> AppResult<ExitCode> {
    let mut vcd = VcdFile::open(file)?;

    let wanted: Vec<&str> = signals
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !wanted.is_empty() {
        vcd.filter_signals(&wanted);
    }

    if let Some(output) = output {
        let source = std::fs::read_to_string(file).map_err(VcdError::Io)?;
        let mut writer = BufWriter::new(std::fs::File::create(output).map_err(VcdError::Io)?);
        write_filtered(&source, &vcd.symbols(), &mut writer)?;
        writer.flush()?;
        eprintln!("Filtered VCD written to: {}", output.display());
        eprintln!("Open with: gtkwave {}", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    match format {
        VcdFormat::Json => println!("{}", format_json(&vcd)?),
        VcdFormat::Text => println!("{}", format_text(&vcd)),
    }
    Ok(ExitCode::SUCCESS)
}
