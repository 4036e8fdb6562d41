use crate::config::settings::{Timings, WorldSettings};
use crate::config::RunConfig;
use crate::domain::capacity::StorageLayout;
use crate::utils::error::{Result, SimError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub world: Option<WorldConfig>,
    pub tunnel: Option<TunnelConfig>,
    pub timing: Option<TimingConfig>,
    pub transit: Option<TransitConfig>,
    pub storage: Option<StorageLayout>,
    pub run: Option<RunSection>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub ports: Option<usize>,
    pub initial_quantity: Option<u64>,
    pub generation_threshold: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub capacity: Option<usize>,
    pub delay_min_ms: Option<u64>,
    pub delay_max_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub movement_tick_ms: Option<u64>,
    pub idle_interval_ms: Option<u64>,
    pub generation_pacing_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitConfig {
    pub max_in_flight: Option<usize>,
    pub max_redirects: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub interval_secs: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SimError::MissingConfigError {
                field: path.display().to_string(),
            },
            _ => SimError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SimError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SIM_SEED})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SimError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 合併預設值，產生世界設定
    pub fn world_settings(&self) -> WorldSettings {
        let defaults = WorldSettings::default();
        let default_timing = Timings::default();

        let world = self.world.as_ref();
        let tunnel = self.tunnel.as_ref();
        let timing = self.timing.as_ref();
        let transit = self.transit.as_ref();

        WorldSettings {
            port_count: world.and_then(|w| w.ports).unwrap_or(defaults.port_count),
            initial_quantity: world
                .and_then(|w| w.initial_quantity)
                .unwrap_or(defaults.initial_quantity),
            generation_threshold: world
                .and_then(|w| w.generation_threshold)
                .unwrap_or(defaults.generation_threshold),
            seed: world.and_then(|w| w.seed),
            tunnel_capacity: tunnel
                .and_then(|t| t.capacity)
                .unwrap_or(defaults.tunnel_capacity),
            max_in_flight: transit
                .and_then(|t| t.max_in_flight)
                .unwrap_or(defaults.max_in_flight),
            max_redirects: transit
                .and_then(|t| t.max_redirects)
                .unwrap_or(defaults.max_redirects),
            timing: Timings {
                tunnel_delay_min_ms: tunnel
                    .and_then(|t| t.delay_min_ms)
                    .unwrap_or(default_timing.tunnel_delay_min_ms),
                tunnel_delay_max_ms: tunnel
                    .and_then(|t| t.delay_max_ms)
                    .unwrap_or(default_timing.tunnel_delay_max_ms),
                movement_tick_ms: timing
                    .and_then(|t| t.movement_tick_ms)
                    .unwrap_or(default_timing.movement_tick_ms),
                idle_interval_ms: timing
                    .and_then(|t| t.idle_interval_ms)
                    .unwrap_or(default_timing.idle_interval_ms),
                generation_pacing_ms: timing
                    .and_then(|t| t.generation_pacing_ms)
                    .unwrap_or(default_timing.generation_pacing_ms),
            },
            storage: self.storage.unwrap_or_default(),
        }
    }

    pub fn run_duration(&self) -> Option<Duration> {
        self.run
            .as_ref()
            .and_then(|r| r.duration_secs)
            .map(Duration::from_secs)
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(
            self.monitoring
                .as_ref()
                .and_then(|m| m.interval_secs)
                .unwrap_or(10),
        )
    }

    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            world: self.world_settings(),
            duration: self.run_duration(),
            monitor: self.monitoring_enabled(),
            monitor_interval: self.monitor_interval(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_run_config().validate()
    }
}
