use crate::config::settings::WorldSettings;
use crate::core::lifecycle::{LifecycleReport, LifecycleSettings, PortLifecycle};
use crate::core::port::{Port, PortFabricator, PortRegistry, PortRegistryBuilder, PortSnapshot};
use crate::core::transit::{TransitCounters, TransitPipeline, TransitSettings};
use crate::core::tunnel::Tunnel;
use crate::domain::model::{Commodity, Locatable, Location, PortId};
use crate::domain::ports::{EventSink, RandomSource, ShipDispatcher};
use crate::domain::ship::IdGenerator;
use crate::utils::error::{Result, SimError};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TunnelSnapshot {
    pub capacity: usize,
    pub inside: usize,
    pub peak: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub taken_at: DateTime<Utc>,
    pub ports: Vec<PortSnapshot>,
    pub tunnel: TunnelSnapshot,
    pub transit: TransitCounters,
}

impl WorldSnapshot {
    pub fn total_docked(&self) -> usize {
        self.ports
            .iter()
            .map(|p| p.docked_small + p.docked_middle + p.docked_big)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortReport {
    pub port: PortId,
    #[serde(flatten)]
    pub lifecycle: LifecycleReport,
}

/// Owns every shared piece of a running simulation: the tunnel, the frozen
/// port registry, the transit pipeline and the cancellation token all loops
/// listen to.
pub struct World {
    settings: WorldSettings,
    tunnel: Arc<Tunnel>,
    registry: Arc<PortRegistry>,
    transit: TransitPipeline,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    loops: TaskTracker,
    handles: Vec<(PortId, JoinHandle<LifecycleReport>)>,
}

impl World {
    /// Creates `port_count` ports at random locations, each holding
    /// `initial_quantity` units of a random commodity.
    pub fn bootstrap(
        settings: WorldSettings,
        sink: Arc<dyn EventSink>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        settings.validate()?;

        let fabricator = PortFabricator::new(
            Arc::new(IdGenerator::new()),
            Arc::new(IdGenerator::new()),
            settings.storage,
            random.clone(),
        );
        let mut builder = PortRegistryBuilder::new();
        for _ in 0..settings.port_count {
            builder.register(fabricator.create(settings.initial_quantity));
        }

        Ok(Self::assemble(settings, builder.build(), sink, random))
    }

    /// Same as [`World::bootstrap`] but with caller-chosen port locations and
    /// stock. `settings.port_count` is ignored.
    pub fn with_ports(
        settings: WorldSettings,
        ports: &[(Location, Commodity)],
        sink: Arc<dyn EventSink>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        settings.validate()?;

        let fabricator = PortFabricator::new(
            Arc::new(IdGenerator::new()),
            Arc::new(IdGenerator::new()),
            settings.storage,
            random.clone(),
        );
        let mut builder = PortRegistryBuilder::new();
        for (location, commodity) in ports {
            builder.register(fabricator.create_at(*location, *commodity));
        }

        Ok(Self::assemble(settings, builder.build(), sink, random))
    }

    fn assemble(
        settings: WorldSettings,
        registry: Arc<PortRegistry>,
        sink: Arc<dyn EventSink>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let tunnel = Arc::new(Tunnel::new(
            Location::ORIGIN,
            settings.tunnel_capacity,
            Duration::from_millis(settings.timing.tunnel_delay_min_ms),
            Duration::from_millis(settings.timing.tunnel_delay_max_ms),
        ));
        let cancel = CancellationToken::new();
        let transit = TransitPipeline::new(
            tunnel.clone(),
            registry.clone(),
            random.clone(),
            sink.clone(),
            cancel.clone(),
            TransitSettings {
                movement_tick: settings.timing.movement_tick(),
                max_in_flight: settings.max_in_flight,
                redirect_limit: settings.redirect_limit(),
            },
        );

        for port in registry.iter() {
            tracing::info!(
                "🏗️ Port {} ready at {} with {}",
                port.id(),
                port.location(),
                port.kind()
            );
        }

        Self {
            settings,
            tunnel,
            registry,
            transit,
            random,
            sink,
            cancel,
            loops: TaskTracker::new(),
            handles: Vec::new(),
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn tunnel(&self) -> &Arc<Tunnel> {
        &self.tunnel
    }

    pub fn registry(&self) -> &Arc<PortRegistry> {
        &self.registry
    }

    pub fn transit(&self) -> &TransitPipeline {
        &self.transit
    }

    pub fn port(&self, id: PortId) -> Result<Arc<Port>> {
        self.registry.get(id)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty() && !self.cancel.is_cancelled()
    }

    /// Spawns one lifecycle loop per port. Calling it twice is a no-op.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            tracing::warn!("⚠️ World already started");
            return;
        }

        let dispatcher: Arc<dyn ShipDispatcher> = Arc::new(self.transit.clone());
        let lifecycle = LifecycleSettings {
            idle_interval: self.settings.timing.idle_interval(),
            generation_pacing: self.settings.timing.generation_pacing(),
            generation_threshold: self.settings.generation_threshold,
        };

        for port in self.registry.iter() {
            let task = PortLifecycle::new(
                port.clone(),
                dispatcher.clone(),
                self.random.clone(),
                self.sink.clone(),
                self.cancel.clone(),
                lifecycle,
            );
            self.handles.push((port.id(), self.loops.spawn(task.run())));
        }

        tracing::info!(
            "🚀 World started: {} ports, tunnel capacity {}",
            self.registry.len(),
            self.tunnel.capacity()
        );
    }

    /// Cancels every loop and every ship in transit, then waits for all of
    /// them to finish. A failed loop is reported only after everything else
    /// has been joined.
    pub async fn shutdown(&mut self) -> Result<Vec<PortReport>> {
        tracing::info!("🛑 Shutting down world");
        self.cancel.cancel();
        self.loops.close();

        let mut reports = Vec::with_capacity(self.handles.len());
        let mut failure: Option<SimError> = None;
        for (port, handle) in self.handles.drain(..) {
            match handle.await {
                Ok(lifecycle) => reports.push(PortReport { port, lifecycle }),
                Err(e) => {
                    tracing::error!("❌ Lifecycle of port {} failed: {}", port, e);
                    failure.get_or_insert(SimError::TaskFailed(e));
                }
            }
        }

        self.loops.wait().await;
        self.transit.wait().await;
        tracing::info!("✅ World stopped, {} ship(s) still in flight", self.transit.in_flight());

        match failure {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    pub async fn snapshot(&self) -> WorldSnapshot {
        let mut ports = Vec::with_capacity(self.registry.len());
        for port in self.registry.iter() {
            ports.push(port.snapshot().await);
        }

        WorldSnapshot {
            taken_at: Utc::now(),
            ports,
            tunnel: TunnelSnapshot {
                capacity: self.tunnel.capacity(),
                inside: self.tunnel.inside(),
                peak: self.tunnel.peak(),
            },
            transit: self.transit.counters(),
        }
    }
}
