use crate::domain::capacity::Tier;
use crate::domain::model::{CommodityKind, Location, PortId, ShipId};
use std::fmt;
use std::time::Duration;

/// Every observable state transition of the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    PortActive { port: PortId },
    PortSleeping { port: PortId },
    PortStopped { port: PortId },
    GenerationChecked { port: PortId, quantity: u64, threshold: u64, approved: bool },
    ShipFabricated { port: PortId, ship: ShipId, tier: Tier, kind: CommodityKind },
    StorageChecked { port: PortId, docked: usize },
    ShipUnloaded { port: PortId, ship: ShipId, before: u64, after: u64 },
    CargoMismatch { port: PortId, ship: ShipId, port_kind: CommodityKind, cargo_kind: CommodityKind },
    StorageCleared { port: PortId },
    ShipDispatched { ship: ShipId, from: PortId, to: PortId },
    TunnelWaiting { ship: ShipId },
    TunnelEntered { ship: ShipId, dwell: Duration, inside: usize },
    TunnelExited { ship: ShipId },
    MovementStarted { ship: ShipId, from: Location, to: Location, port: PortId },
    MovementStep { ship: ShipId, at: Location },
    MovementFinished { ship: ShipId, at: Location },
    ShipPlaced { ship: ShipId, port: PortId, tier: Tier, slot: usize },
    PlacementRejected { ship: ShipId, port: PortId, tier: Tier },
    ShipRedirected { ship: ShipId, from: PortId, to: PortId, attempt: u32 },
    ShipDropped { ship: ShipId, redirects: u32 },
    TransitCancelled { ship: ShipId },
}

impl SimEvent {
    /// Stable short name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::PortActive { .. } => "port_active",
            SimEvent::PortSleeping { .. } => "port_sleeping",
            SimEvent::PortStopped { .. } => "port_stopped",
            SimEvent::GenerationChecked { .. } => "generation_checked",
            SimEvent::ShipFabricated { .. } => "ship_fabricated",
            SimEvent::StorageChecked { .. } => "storage_checked",
            SimEvent::ShipUnloaded { .. } => "ship_unloaded",
            SimEvent::CargoMismatch { .. } => "cargo_mismatch",
            SimEvent::StorageCleared { .. } => "storage_cleared",
            SimEvent::ShipDispatched { .. } => "ship_dispatched",
            SimEvent::TunnelWaiting { .. } => "tunnel_waiting",
            SimEvent::TunnelEntered { .. } => "tunnel_entered",
            SimEvent::TunnelExited { .. } => "tunnel_exited",
            SimEvent::MovementStarted { .. } => "movement_started",
            SimEvent::MovementStep { .. } => "movement_step",
            SimEvent::MovementFinished { .. } => "movement_finished",
            SimEvent::ShipPlaced { .. } => "ship_placed",
            SimEvent::PlacementRejected { .. } => "placement_rejected",
            SimEvent::ShipRedirected { .. } => "ship_redirected",
            SimEvent::ShipDropped { .. } => "ship_dropped",
            SimEvent::TransitCancelled { .. } => "transit_cancelled",
        }
    }

    /// Chatty events that belong at debug level.
    pub fn is_verbose(&self) -> bool {
        matches!(
            self,
            SimEvent::MovementStep { .. } | SimEvent::PortSleeping { .. } | SimEvent::TunnelWaiting { .. }
        )
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEvent::PortActive { port } => write!(f, "Port: {} is active", port),
            SimEvent::PortSleeping { port } => write!(f, "Port: {} is sleeping", port),
            SimEvent::PortStopped { port } => write!(f, "Port: {} is stopped", port),
            SimEvent::GenerationChecked { port, quantity, threshold, approved } => {
                if *approved {
                    write!(f, "Port: {} has enough product to build a ship ({} > {})", port, quantity, threshold)
                } else {
                    write!(f, "Port: {} does not have enough product ({} <= {})", port, quantity, threshold)
                }
            }
            SimEvent::ShipFabricated { port, ship, tier, kind } => {
                write!(f, "Port: {} created ship {} ({} {})", port, ship, tier, kind)
            }
            SimEvent::StorageChecked { port, docked } => {
                write!(f, "Port: {} is checking {} ship(s) in storage", port, docked)
            }
            SimEvent::ShipUnloaded { port, ship, before, after } => {
                write!(f, "Port: {} unloaded ship {} (stock {} -> {})", port, ship, before, after)
            }
            SimEvent::CargoMismatch { port, ship, port_kind, cargo_kind } => write!(
                f,
                "Port: {} skipped unloading ship {} ({} cargo, port trades {})",
                port, ship, cargo_kind, port_kind
            ),
            SimEvent::StorageCleared { port } => write!(f, "Port: {} cleans the storage", port),
            SimEvent::ShipDispatched { ship, from, to } => {
                write!(f, "Ship: {} sent from port {} to port {}", ship, from, to)
            }
            SimEvent::TunnelWaiting { ship } => write!(f, "Ship: {} waits to enter the tunnel", ship),
            SimEvent::TunnelEntered { ship, dwell, inside } => write!(
                f,
                "Ship: {} is entering the tunnel for {} seconds ({} inside)",
                ship,
                dwell.as_secs(),
                inside
            ),
            SimEvent::TunnelExited { ship } => write!(f, "Ship: {} has exited the tunnel", ship),
            SimEvent::MovementStarted { ship, from, to, port } => write!(
                f,
                "Ship: {} begins the journey to Port: {} ({} -> {})",
                ship, port, from, to
            ),
            SimEvent::MovementStep { ship, at } => write!(f, "Ship: {} moved to {}", ship, at),
            SimEvent::MovementFinished { ship, at } => {
                write!(f, "Ship: {} reached the point of the route at {}", ship, at)
            }
            SimEvent::ShipPlaced { ship, port, tier, slot } => {
                write!(f, "Ship: {} docked at port {} ({} slot {})", ship, port, tier, slot)
            }
            SimEvent::PlacementRejected { ship, port, tier } => {
                write!(f, "Port: {} has no {} slot for ship {}", port, tier, ship)
            }
            SimEvent::ShipRedirected { ship, from, to, attempt } => write!(
                f,
                "Ship: {} redirected from port {} to port {} (attempt {})",
                ship, from, to, attempt
            ),
            SimEvent::ShipDropped { ship, redirects } => {
                write!(f, "Ship: {} dropped after {} redirects", ship, redirects)
            }
            SimEvent::TransitCancelled { ship } => write!(f, "Ship: {} transit cancelled", ship),
        }
    }
}
