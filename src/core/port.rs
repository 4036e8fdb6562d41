use crate::domain::capacity::{StorageLayout, Tier};
use crate::domain::model::{Commodity, CommodityKind, Locatable, Location, PortId, UnloadOutcome};
use crate::domain::ports::RandomSource;
use crate::domain::ship::{IdGenerator, Ship, ShipFabricator};
use crate::domain::storage::{ShipStorage, StorageFull};
use crate::utils::error::{Result, SimError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ports are spawned inside `[0, LOCATION_BOUND)` on both axes.
pub const LOCATION_BOUND: i32 = 100;

/// A trading port. Storage and stock each sit behind the port's own lock, so
/// a transit docking here never contends with other ports.
#[derive(Debug)]
pub struct Port {
    id: PortId,
    location: Location,
    kind: CommodityKind,
    layout: StorageLayout,
    commodity: Mutex<Commodity>,
    storage: Mutex<ShipStorage>,
    fabricator: ShipFabricator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSnapshot {
    pub id: PortId,
    pub location: Location,
    pub commodity: Commodity,
    pub docked_small: usize,
    pub docked_middle: usize,
    pub docked_big: usize,
}

impl Port {
    pub fn new(
        id: PortId,
        location: Location,
        commodity: Commodity,
        layout: StorageLayout,
        ship_ids: Arc<IdGenerator>,
    ) -> Self {
        Self {
            id,
            location,
            kind: commodity.kind,
            layout,
            commodity: Mutex::new(commodity),
            storage: Mutex::new(ShipStorage::new(layout)),
            fabricator: ShipFabricator::new(id, ship_ids),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn kind(&self) -> CommodityKind {
        self.kind
    }

    pub fn fabricator(&self) -> &ShipFabricator {
        &self.fabricator
    }

    pub async fn quantity(&self) -> u64 {
        self.commodity.lock().await.quantity
    }

    pub async fn commodity(&self) -> Commodity {
        *self.commodity.lock().await
    }

    /// Placement at this port, serialized with every other storage access.
    pub async fn dock(&self, ship: Ship) -> std::result::Result<usize, StorageFull> {
        self.storage.lock().await.place(ship)
    }

    /// Takes every docked ship out and leaves a fresh, empty storage behind.
    pub async fn undock_all(&self) -> Vec<Ship> {
        let mut storage = self.storage.lock().await;
        let ships = storage.drain();
        *storage = ShipStorage::new(self.layout);
        ships
    }

    pub async fn unload(&self, ship: &mut Ship) -> UnloadOutcome {
        self.commodity.lock().await.absorb(&mut ship.commodity)
    }

    pub async fn docked(&self, tier: Tier) -> usize {
        self.storage.lock().await.docked(tier)
    }

    pub async fn snapshot(&self) -> PortSnapshot {
        let commodity = self.commodity().await;
        let storage = self.storage.lock().await;
        PortSnapshot {
            id: self.id,
            location: self.location,
            commodity,
            docked_small: storage.docked(Tier::Small),
            docked_middle: storage.docked(Tier::Middle),
            docked_big: storage.docked(Tier::Big),
        }
    }
}

impl Locatable for Port {
    fn location(&self) -> Location {
        self.location
    }
}

/// Creates ports with ids from the world's port counter.
pub struct PortFabricator {
    port_ids: Arc<IdGenerator>,
    ship_ids: Arc<IdGenerator>,
    layout: StorageLayout,
    random: Arc<dyn RandomSource>,
}

impl PortFabricator {
    pub fn new(
        port_ids: Arc<IdGenerator>,
        ship_ids: Arc<IdGenerator>,
        layout: StorageLayout,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            port_ids,
            ship_ids,
            layout,
            random,
        }
    }

    /// Random location, random commodity kind holding `quantity` units.
    pub fn create(&self, quantity: u64) -> Port {
        let location = Location::new(
            self.random.coordinate(LOCATION_BOUND),
            self.random.coordinate(LOCATION_BOUND),
        );
        let kind = self.random.commodity_kind();
        self.create_at(location, Commodity::new(kind, quantity))
    }

    pub fn create_at(&self, location: Location, commodity: Commodity) -> Port {
        Port::new(
            PortId(self.port_ids.next_id()),
            location,
            commodity,
            self.layout,
            self.ship_ids.clone(),
        )
    }
}

/// Every port of the world. Frozen before any loop starts, read lock-free
/// afterwards.
#[derive(Debug, Default)]
pub struct PortRegistry {
    ports: Vec<Arc<Port>>,
}

#[derive(Debug, Default)]
pub struct PortRegistryBuilder {
    ports: Vec<Arc<Port>>,
}

impl PortRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, port: Port) -> Arc<Port> {
        let port = Arc::new(port);
        self.ports.push(port.clone());
        port
    }

    pub fn build(self) -> Arc<PortRegistry> {
        Arc::new(PortRegistry { ports: self.ports })
    }
}

impl PortRegistry {
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Port>> {
        self.ports.iter()
    }

    pub fn get(&self, id: PortId) -> Result<Arc<Port>> {
        self.ports
            .iter()
            .find(|port| port.id() == id)
            .cloned()
            .ok_or(SimError::UnknownPort { port_id: id })
    }

    /// Uniform pick over every port.
    pub fn pick_random(&self, random: &dyn RandomSource) -> Result<Arc<Port>> {
        if self.ports.is_empty() {
            return Err(SimError::EmptyRegistry);
        }
        Ok(self.ports[random.index(self.ports.len())].clone())
    }

    /// Uniform pick over every port except `excluded`. Falls back to
    /// `excluded` itself when it is the only port.
    pub fn pick_random_except(&self, random: &dyn RandomSource, excluded: PortId) -> Result<Arc<Port>> {
        let candidates: Vec<&Arc<Port>> = self.ports.iter().filter(|p| p.id() != excluded).collect();
        if candidates.is_empty() {
            return self.pick_random(random);
        }
        Ok(candidates[random.index(candidates.len())].clone())
    }
}
