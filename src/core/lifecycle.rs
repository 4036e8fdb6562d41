use crate::core::port::Port;
use crate::domain::events::SimEvent;
use crate::domain::model::{Locatable, PortId, ShipId, UnloadOutcome};
use crate::domain::ports::{EventSink, RandomSource, ShipDispatcher};
use crate::utils::error::{Result, SimError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub idle_interval: Duration,
    pub generation_pacing: Duration,
    /// 庫存必須嚴格大於此值才會造船
    pub generation_threshold: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Sleeping,
    Generating,
    CheckingStorage,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LifecycleReport {
    pub cycles: u64,
    pub ships_fabricated: u64,
    pub ships_unloaded: u64,
    pub ships_redispatched: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageCheck {
    pub unloaded: usize,
    pub mismatched: usize,
}

/// The autonomous loop of one port: sleep, try to build a ship, then empty
/// the storage, until the world is cancelled.
pub struct PortLifecycle {
    port: Arc<Port>,
    dispatcher: Arc<dyn ShipDispatcher>,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    settings: LifecycleSettings,
    state: LifecycleState,
    report: LifecycleReport,
}

impl PortLifecycle {
    pub fn new(
        port: Arc<Port>,
        dispatcher: Arc<dyn ShipDispatcher>,
        random: Arc<dyn RandomSource>,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            port,
            dispatcher,
            random,
            sink,
            cancel,
            settings,
            state: LifecycleState::Sleeping,
            report: LifecycleReport::default(),
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::trace!(port = %self.port.id(), from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    /// Sleeps for `duration` unless cancelled first.
    async fn pause(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SimError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Runs until cancelled and returns what the port did.
    pub async fn run(mut self) -> LifecycleReport {
        let port = self.port.id();
        self.sink.emit(SimEvent::PortActive { port });

        loop {
            match self.cycle().await {
                Ok(()) => self.report.cycles += 1,
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    // 單次循環失敗不終止港口
                    tracing::warn!("⚠️ Port {} cycle failed: {}", port, e);
                }
            }
        }

        self.transition(LifecycleState::Stopped);
        self.sink.emit(SimEvent::PortStopped { port });
        self.report
    }

    async fn cycle(&mut self) -> Result<()> {
        self.transition(LifecycleState::Sleeping);
        self.sink.emit(SimEvent::PortSleeping { port: self.port.id() });
        self.pause(self.settings.idle_interval).await?;

        self.transition(LifecycleState::Generating);
        let generated = self.generate().await;
        self.pause(self.settings.generation_pacing).await?;
        generated?;

        self.transition(LifecycleState::CheckingStorage);
        self.check_storage().await?;
        Ok(())
    }

    /// Builds and dispatches one ship when stock is above the threshold.
    /// Stock is not charged for the ship.
    pub async fn generate(&mut self) -> Result<Option<ShipId>> {
        let port = self.port.id();
        let quantity = self.port.quantity().await;
        let approved = quantity > self.settings.generation_threshold;

        self.sink.emit(SimEvent::GenerationChecked {
            port,
            quantity,
            threshold: self.settings.generation_threshold,
            approved,
        });
        if !approved {
            return Ok(None);
        }

        let ship = self
            .port
            .fabricator()
            .fabricate(self.port.location(), self.random.as_ref());
        let ship_id = ship.id;
        self.sink.emit(SimEvent::ShipFabricated {
            port,
            ship: ship_id,
            tier: ship.tier,
            kind: ship.commodity.kind,
        });
        self.report.ships_fabricated += 1;

        if let Err(e) = self.dispatcher.dispatch(ship, port).await {
            self.sink.emit(SimEvent::TransitCancelled { ship: ship_id });
            return Err(e);
        }
        Ok(Some(ship_id))
    }

    /// Takes every docked ship out of storage, unloads matching cargo and
    /// sends each ship on to a random port. When a dispatch fails, that ship
    /// and every ship not yet handled are reported as cancelled.
    pub async fn check_storage(&mut self) -> Result<StorageCheck> {
        let port = self.port.id();
        let ships = self.port.undock_all().await;
        self.sink.emit(SimEvent::StorageChecked {
            port,
            docked: ships.len(),
        });

        let mut check = StorageCheck::default();
        let mut ships = ships.into_iter();
        while let Some(mut ship) = ships.next() {
            match self.port.unload(&mut ship).await {
                UnloadOutcome::Transferred { before, after } => {
                    check.unloaded += 1;
                    self.report.ships_unloaded += 1;
                    self.sink.emit(SimEvent::ShipUnloaded {
                        port,
                        ship: ship.id,
                        before,
                        after,
                    });
                }
                UnloadOutcome::Mismatch => {
                    check.mismatched += 1;
                    self.sink.emit(SimEvent::CargoMismatch {
                        port,
                        ship: ship.id,
                        port_kind: self.port.kind(),
                        cargo_kind: ship.commodity.kind,
                    });
                }
            }

            let ship_id = ship.id;
            if let Err(e) = self.dispatcher.dispatch(ship, port).await {
                // 已出港的船不能默默消失
                self.sink.emit(SimEvent::TransitCancelled { ship: ship_id });
                for abandoned in ships {
                    self.sink.emit(SimEvent::TransitCancelled { ship: abandoned.id });
                }
                return Err(e);
            }
            self.report.ships_redispatched += 1;
        }

        self.sink.emit(SimEvent::StorageCleared { port });
        Ok(check)
    }
}
