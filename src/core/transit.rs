use crate::core::movement;
use crate::core::port::{Port, PortRegistry};
use crate::core::tunnel::Tunnel;
use crate::domain::events::SimEvent;
use crate::domain::model::{Locatable, PortId};
use crate::domain::ports::{EventSink, RandomSource, ShipDispatcher};
use crate::domain::ship::Ship;
use crate::domain::storage::StorageFull;
use crate::utils::error::{Result, SimError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitSettings {
    pub movement_tick: Duration,
    pub max_in_flight: usize,
    /// `None` keeps redirecting forever
    pub redirect_limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitOutcome {
    Docked { port: PortId, slot: usize, redirects: u32 },
    Dropped { redirects: u32 },
}

#[derive(Debug, Default)]
struct TransitStats {
    waiting: AtomicUsize,
    docked: AtomicU64,
    redirected: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TransitCounters {
    pub in_flight: usize,
    /// 已派出但還在等候名額的船
    pub waiting: usize,
    pub docked: u64,
    pub redirected: u64,
    pub dropped: u64,
}

struct TransitInner {
    tunnel: Arc<Tunnel>,
    registry: Arc<PortRegistry>,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    budget: Arc<Semaphore>,
    settings: TransitSettings,
    stats: TransitStats,
}

/// Carries ships between ports: tunnel, then movement, then docking, with a
/// redirect to another port whenever the destination has no free slot.
///
/// Each dispatched ship is one tracked task. A task waits for a permit from
/// the spawn budget before its journey starts, so dispatching never blocks
/// the caller; the tunnel gate still limits how many are inside at once.
#[derive(Clone)]
pub struct TransitPipeline {
    inner: Arc<TransitInner>,
}

impl TransitPipeline {
    pub fn new(
        tunnel: Arc<Tunnel>,
        registry: Arc<PortRegistry>,
        random: Arc<dyn RandomSource>,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
        settings: TransitSettings,
    ) -> Self {
        Self {
            inner: Arc::new(TransitInner {
                tunnel,
                registry,
                random,
                sink,
                cancel,
                tracker: TaskTracker::new(),
                budget: Arc::new(Semaphore::new(settings.max_in_flight)),
                settings,
                stats: TransitStats::default(),
            }),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.settings.max_in_flight - self.inner.budget.available_permits()
    }

    pub fn counters(&self) -> TransitCounters {
        let stats = &self.inner.stats;
        TransitCounters {
            in_flight: self.in_flight(),
            waiting: stats.waiting.load(Ordering::SeqCst),
            docked: stats.docked.load(Ordering::Relaxed),
            redirected: stats.redirected.load(Ordering::Relaxed),
            dropped: stats.dropped.load(Ordering::Relaxed),
        }
    }

    /// Waits for every spawned transit to finish. Cancel the world token
    /// first, or this waits for ships to dock naturally.
    pub async fn wait(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    /// Sends `ship` to `destination` and spawns the journey as its own task.
    /// Returns as soon as the task is spawned; the task itself queues on the
    /// spawn budget.
    pub async fn send_to(&self, ship: Ship, from: PortId, destination: Arc<Port>) -> Result<()> {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return Err(SimError::Cancelled);
        }

        inner.sink.emit(SimEvent::ShipDispatched {
            ship: ship.id,
            from,
            to: destination.id(),
        });

        inner.stats.waiting.fetch_add(1, Ordering::SeqCst);
        let pipeline = self.clone();
        inner.tracker.spawn(async move {
            let ship_id = ship.id;
            let inner = &pipeline.inner;
            let permit = tokio::select! {
                biased;
                _ = inner.cancel.cancelled() => None,
                permit = inner.budget.clone().acquire_owned() => permit.ok(),
            };
            inner.stats.waiting.fetch_sub(1, Ordering::SeqCst);

            let Some(_permit) = permit else {
                inner.sink.emit(SimEvent::TransitCancelled { ship: ship_id });
                return;
            };

            match pipeline.carry(ship, destination).await {
                Ok(_) => {}
                Err(SimError::Cancelled) => {
                    inner.sink.emit(SimEvent::TransitCancelled { ship: ship_id });
                }
                Err(e) => {
                    tracing::error!("❌ Transit of ship {} failed: {}", ship_id, e);
                }
            }
        });

        Ok(())
    }

    /// Runs the whole journey inline: enter tunnel, move, dock, and on a full
    /// tier pick another port and start over.
    pub async fn carry(&self, mut ship: Ship, destination: Arc<Port>) -> Result<TransitOutcome> {
        let inner = &self.inner;
        let mut destination = destination;
        let mut redirects = 0u32;

        loop {
            inner
                .tunnel
                .traverse(ship.id, inner.random.as_ref(), inner.sink.as_ref(), &inner.cancel)
                .await?;

            movement::move_to(
                ship.id,
                &mut ship.location,
                destination.location(),
                destination.id(),
                inner.settings.movement_tick,
                inner.sink.as_ref(),
                &inner.cancel,
            )
            .await?;

            let (ship_id, tier) = (ship.id, ship.tier);
            match destination.dock(ship).await {
                Ok(slot) => {
                    inner.stats.docked.fetch_add(1, Ordering::Relaxed);
                    inner.sink.emit(SimEvent::ShipPlaced {
                        ship: ship_id,
                        port: destination.id(),
                        tier,
                        slot,
                    });
                    return Ok(TransitOutcome::Docked {
                        port: destination.id(),
                        slot,
                        redirects,
                    });
                }
                Err(StorageFull { tier, ship: rejected }) => {
                    ship = rejected;
                    inner.sink.emit(SimEvent::PlacementRejected {
                        ship: ship.id,
                        port: destination.id(),
                        tier,
                    });

                    if let Some(limit) = inner.settings.redirect_limit {
                        if redirects >= limit {
                            inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
                            let reason = SimError::StorageFull {
                                port_id: destination.id(),
                                tier,
                            };
                            tracing::warn!("⚠️ Dropping ship {} after {} redirects: {}", ship.id, redirects, reason);
                            inner.sink.emit(SimEvent::ShipDropped {
                                ship: ship.id,
                                redirects,
                            });
                            return Ok(TransitOutcome::Dropped { redirects });
                        }
                    }

                    redirects += 1;
                    inner.stats.redirected.fetch_add(1, Ordering::Relaxed);
                    let next = inner
                        .registry
                        .pick_random_except(inner.random.as_ref(), destination.id())?;
                    inner.sink.emit(SimEvent::ShipRedirected {
                        ship: ship.id,
                        from: destination.id(),
                        to: next.id(),
                        attempt: redirects,
                    });
                    destination = next;
                }
            }
        }
    }
}

#[async_trait]
impl ShipDispatcher for TransitPipeline {
    /// Uniformly random destination out of the whole registry.
    async fn dispatch(&self, ship: Ship, from: PortId) -> Result<()> {
        let destination = self.inner.registry.pick_random(self.inner.random.as_ref())?;
        self.send_to(ship, from, destination).await
    }
}
