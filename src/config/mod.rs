pub mod settings;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, Validate};
use settings::WorldSettings;
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

/// Resolved settings for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub world: WorldSettings,
    /// `None` runs until Ctrl-C
    pub duration: Option<Duration>,
    pub monitor: bool,
    pub monitor_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            world: WorldSettings::default(),
            duration: None,
            monitor: false,
            monitor_interval: Duration::from_secs(10),
        }
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        self.world.validate()?;
        validate_positive_number(
            "monitoring.interval_secs",
            self.monitor_interval.as_secs(),
            1,
        )
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "port-tunnel-sim")]
#[command(about = "Simulates ports trading through a shared tunnel")]
pub struct CliConfig {
    #[arg(long, help = "Optional TOML file with world settings")]
    pub config: Option<String>,

    #[arg(long, help = "Number of ports to create")]
    pub ports: Option<usize>,

    #[arg(long, help = "Seed for the shared random source")]
    pub seed: Option<u64>,

    #[arg(long, help = "Stop after this many seconds (default: run until Ctrl-C)")]
    pub duration_secs: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log periodic world and process statistics")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML（若有）並套用命令列覆蓋
    pub fn to_run_config(&self) -> Result<RunConfig> {
        let mut run = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.to_run_config(),
            None => RunConfig::default(),
        };

        if let Some(ports) = self.ports {
            run.world.port_count = ports;
        }
        if let Some(seed) = self.seed {
            run.world.seed = Some(seed);
        }
        if let Some(secs) = self.duration_secs {
            run.duration = Some(Duration::from_secs(secs));
        }
        run.monitor |= self.monitor;

        Ok(run)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_defaults() {
        let cli = CliConfig::parse_from(["port-tunnel-sim"]);
        let run = cli.to_run_config().unwrap();
        assert_eq!(run, RunConfig::default());
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[world]\nports = 8\nseed = 1\n\n[run]\nduration_secs = 60\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from([
            "port-tunnel-sim",
            "--config",
            path.as_str(),
            "--seed",
            "5",
            "--monitor",
        ]);
        let run = cli.to_run_config().unwrap();

        assert_eq!(run.world.port_count, 8);
        assert_eq!(run.world.seed, Some(5));
        assert_eq!(run.duration, Some(Duration::from_secs(60)));
        assert!(run.monitor);
    }

    #[test]
    fn test_cli_zero_ports_fails_validation() {
        let cli = CliConfig::parse_from(["port-tunnel-sim", "--ports", "0"]);
        assert!(cli.to_run_config().unwrap().validate().is_err());
    }

    #[test]
    fn test_cli_missing_config_file() {
        let cli = CliConfig::parse_from(["port-tunnel-sim", "--config", "/nonexistent/world.toml"]);
        assert!(cli.to_run_config().is_err());
    }
}
