//! Command line configuration.
//!
//! `Args` is the raw clap surface; `Args::into_config` validates it into a
//! `CheckConfig`, which decides the statistics source and the baseline once per run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::check::Baseline;
use crate::collector::api::{DEFAULT_API_HOST, DEFAULT_API_PORT};
use crate::collector::control::DEFAULT_CONTROL_TOOL;
use crate::collector::{ApiSource, CollectError, ControlSource, MockSource, StatsSource};
use crate::status::{EvalOptions, Thresholds};
use crate::storage::SampleStore;

/// Default base directory for the sample file.
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Monitoring plugin checking PowerDNS authoritative server status.
///
/// A non-zero exit code is generated if the number of DNS queries per second
/// exceeds the warning/critical values. Additionally the security-status of
/// PowerDNS is checked.
#[derive(Parser, Debug)]
#[command(name = "check_pdns_auth", version, about)]
pub struct Args {
    /// Where the PowerDNS control socket lives.
    #[arg(short = 'S', long, value_name = "DIR")]
    pub socket_dir: Option<PathBuf>,

    /// Name of the PowerDNS virtual configuration.
    #[arg(short = 'n', long, default_value = "")]
    pub config_name: String,

    /// Warning threshold (queries/s). 0 disables.
    #[arg(short, long, default_value_t = 0)]
    pub warning: u64,

    /// Critical threshold (queries/s). 0 disables.
    #[arg(short, long, default_value_t = 0)]
    pub critical: u64,

    /// Scratch / temp base directory for the sample file. Must exist.
    #[arg(short, long, default_value = DEFAULT_SCRATCH_DIR)]
    pub scratch: PathBuf,

    /// Print performance data.
    #[arg(short, long)]
    pub perfdata: bool,

    /// Skip the PowerDNS security-status check.
    #[arg(long)]
    pub skipsecurity: bool,

    /// Test mode: use canned data, do not run pdns_control or touch the sample file.
    #[arg(short = 'T', long, conflicts_with = "api")]
    pub test: bool,

    /// Query the HTTP API instead of the control socket.
    #[arg(short = 'A', long)]
    pub api: bool,

    /// API host.
    #[arg(short = 'H', long, default_value = DEFAULT_API_HOST)]
    pub api_host: String,

    /// API port.
    #[arg(short = 'P', long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// API key.
    #[arg(short = 'k', long, env = "PDNS_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// Control utility to run in control socket mode.
    #[arg(long, default_value = DEFAULT_CONTROL_TOOL)]
    pub control_tool: PathBuf,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Increase logging verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Invalid combination of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API mode without a key.
    MissingApiKey,
    /// Scratch directory does not exist.
    ScratchDir(PathBuf),
    /// Zero timeout.
    Timeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "API mode requires an API key (--api-key or PDNS_API_KEY)")
            }
            ConfigError::ScratchDir(path) => {
                write!(f, "scratch directory {} does not exist", path.display())
            }
            ConfigError::Timeout => write!(f, "timeout must be at least 1 second"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where statistics come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Control {
        tool: PathBuf,
        socket_dir: Option<PathBuf>,
    },
    Api {
        host: String,
        port: u16,
        key: String,
        timeout: Duration,
    },
    Test,
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub mode: Mode,
    pub scratch: PathBuf,
    pub config_name: String,
    pub options: EvalOptions,
}

impl Args {
    /// Log level selected by `-v`. Logging is off by default so that the report
    /// line is the only output of a run.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::OFF,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Filter directives for the plugin's own targets, used when `RUST_LOG` is unset.
    pub fn log_directives(&self) -> String {
        let level = self
            .log_level()
            .into_level()
            .map_or_else(|| "off".to_string(), |l| l.as_str().to_lowercase());
        format!("check_pdns_auth={},pdnscheck={}", level, level)
    }

    pub fn into_config(self) -> Result<CheckConfig, ConfigError> {
        let mode = if self.test {
            Mode::Test
        } else if self.api {
            if self.api_key.is_empty() {
                return Err(ConfigError::MissingApiKey);
            }
            if self.timeout == 0 {
                return Err(ConfigError::Timeout);
            }
            Mode::Api {
                host: self.api_host,
                port: self.api_port,
                key: self.api_key,
                timeout: Duration::from_secs(self.timeout),
            }
        } else {
            Mode::Control {
                tool: self.control_tool,
                socket_dir: self.socket_dir.filter(|d| !d.as_os_str().is_empty()),
            }
        };

        if mode != Mode::Test && !self.scratch.is_dir() {
            return Err(ConfigError::ScratchDir(self.scratch));
        }

        Ok(CheckConfig {
            mode,
            scratch: self.scratch,
            config_name: self.config_name,
            options: EvalOptions {
                thresholds: Thresholds::new(self.warning, self.critical),
                skip_security: self.skipsecurity,
                perfdata: self.perfdata,
            },
        })
    }
}

impl CheckConfig {
    /// Builds the statistics source for the selected mode.
    pub fn source(&self) -> Result<Box<dyn StatsSource>, CollectError> {
        let source: Box<dyn StatsSource> = match &self.mode {
            Mode::Control { tool, socket_dir } => {
                let mut src = ControlSource::new(tool);
                if let Some(dir) = socket_dir {
                    src = src.with_socket_dir(dir);
                }
                if !self.config_name.is_empty() {
                    src = src.with_config_name(&self.config_name);
                }
                Box::new(src)
            }
            Mode::Api {
                host,
                port,
                key,
                timeout,
            } => Box::new(ApiSource::new(host, *port, key, *timeout)?),
            Mode::Test => Box::new(MockSource::idle_server()),
        };
        Ok(source)
    }

    /// Test mode compares the sample against itself one second earlier; the
    /// other modes use the sample file.
    pub fn baseline(&self) -> Baseline {
        match self.mode {
            Mode::Test => Baseline::Shifted(1),
            _ => Baseline::Persisted(SampleStore::new(&self.scratch, &self.config_name)),
        }
    }
}
