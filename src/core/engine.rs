use crate::adapters::{SeededRandom, TracingSink};
use crate::config::RunConfig;
use crate::core::world::{PortReport, World, WorldSnapshot};
use crate::domain::ports::EventSink;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::Validate;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DurationElapsed,
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stopped_by: StopReason,
    pub ports: Vec<PortReport>,
    pub snapshot: WorldSnapshot,
}

/// Runs one world from bootstrap to shutdown.
pub struct SimEngine {
    config: RunConfig,
    sink: Arc<dyn EventSink>,
    monitor: SystemMonitor,
}

impl SimEngine {
    pub fn new(config: RunConfig) -> Self {
        Self::new_with_monitoring(config, false)
    }

    pub fn new_with_monitoring(config: RunConfig, monitor_enabled: bool) -> Self {
        let monitor_enabled = monitor_enabled || config.monitor;
        Self {
            config,
            sink: Arc::new(TracingSink),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Replaces the default `TracingSink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs until the configured duration elapses or Ctrl-C arrives, then
    /// shuts the world down and returns the final state.
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let random = Arc::new(SeededRandom::from_optional_seed(self.config.world.seed));
        if let Some(seed) = self.config.world.seed {
            tracing::info!("🎲 Using seed {}", seed);
        }

        let mut world = World::bootstrap(self.config.world.clone(), self.sink.clone(), random)?;
        world.start();
        self.monitor.log_stats("Started");

        let stopped_by = self.wait_for_stop(&world).await;
        match stopped_by {
            StopReason::DurationElapsed => tracing::info!("⏱️ Run duration elapsed"),
            StopReason::Interrupted => tracing::info!("🛑 Interrupted, stopping"),
        }

        let ports = world.shutdown().await?;
        let snapshot = world.snapshot().await;
        self.monitor.log_final_stats();

        Ok(RunReport {
            stopped_by,
            ports,
            snapshot,
        })
    }

    async fn wait_for_stop(&self, world: &World) -> StopReason {
        let mut deadline: Pin<Box<dyn Future<Output = ()> + Send>> = match self.config.duration {
            Some(duration) => Box::pin(tokio::time::sleep(duration)),
            None => Box::pin(std::future::pending::<()>()),
        };

        let mut ticker = tokio::time::interval(self.config.monitor_interval);
        // 第一個 tick 立即觸發，先消耗掉
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!("⚠️ Could not listen for Ctrl-C: {}", e);
                    }
                    return StopReason::Interrupted;
                }
                _ = &mut deadline => return StopReason::DurationElapsed,
                _ = ticker.tick() => self.log_summary(world).await,
            }
        }
    }

    async fn log_summary(&self, world: &World) {
        let snapshot = world.snapshot().await;
        tracing::info!(
            "🌍 In flight: {} ({} queued), tunnel: {}/{} (peak {}), docked: {}, redirected: {}, dropped: {}",
            snapshot.transit.in_flight,
            snapshot.transit.waiting,
            snapshot.tunnel.inside,
            snapshot.tunnel.capacity,
            snapshot.tunnel.peak,
            snapshot.total_docked(),
            snapshot.transit.redirected,
            snapshot.transit.dropped
        );
        for port in &snapshot.ports {
            tracing::debug!(
                "  Port {}: {} ({} / {} / {} docked)",
                port.id,
                port.commodity,
                port.docked_small,
                port.docked_middle,
                port.docked_big
            );
        }
        self.monitor.log_stats("World");
    }
}
