use crate::domain::capacity::StorageLayout;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_half_open_interval, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TUNNEL_CAPACITY: usize = 5;
pub const DEFAULT_GENERATION_THRESHOLD: u64 = 100;
pub const MAX_TUNNEL_CAPACITY: usize = 1024;

/// Everything the world needs to bootstrap and run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub port_count: usize,
    pub initial_quantity: u64,
    pub generation_threshold: u64,
    pub tunnel_capacity: usize,
    /// 同時在途的船隻任務上限
    pub max_in_flight: usize,
    /// 0 表示無限重新導向
    pub max_redirects: u32,
    pub seed: Option<u64>,
    pub timing: Timings,
    pub storage: StorageLayout,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            port_count: 4,
            initial_quantity: 150,
            generation_threshold: DEFAULT_GENERATION_THRESHOLD,
            tunnel_capacity: DEFAULT_TUNNEL_CAPACITY,
            max_in_flight: 1024,
            max_redirects: 32,
            seed: None,
            timing: Timings::default(),
            storage: StorageLayout::default(),
        }
    }
}

impl WorldSettings {
    pub fn redirect_limit(&self) -> Option<u32> {
        (self.max_redirects > 0).then_some(self.max_redirects)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub tunnel_delay_min_ms: u64,
    pub tunnel_delay_max_ms: u64,
    pub movement_tick_ms: u64,
    pub idle_interval_ms: u64,
    pub generation_pacing_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tunnel_delay_min_ms: 2_000,
            tunnel_delay_max_ms: 10_000,
            movement_tick_ms: 1_000,
            idle_interval_ms: 2_000,
            generation_pacing_ms: 5_000,
        }
    }
}

impl Timings {
    pub fn movement_tick(&self) -> Duration {
        Duration::from_millis(self.movement_tick_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn generation_pacing(&self) -> Duration {
        Duration::from_millis(self.generation_pacing_ms)
    }
}

impl Validate for WorldSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("world.port_count", self.port_count as u64, 1)?;
        validate_range(
            "tunnel.capacity",
            self.tunnel_capacity,
            1,
            MAX_TUNNEL_CAPACITY,
        )?;
        validate_positive_number("transit.max_in_flight", self.max_in_flight as u64, 1)?;
        validate_half_open_interval(
            "tunnel.delay_ms",
            self.timing.tunnel_delay_min_ms,
            self.timing.tunnel_delay_max_ms,
        )?;
        validate_positive_number("timing.idle_interval_ms", self.timing.idle_interval_ms, 1)?;
        Ok(())
    }
}
