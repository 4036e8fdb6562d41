use crate::domain::capacity::Tier;
use crate::domain::model::{Commodity, Locatable, Location, PortId, ShipId};
use crate::domain::ports::RandomSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    pub id: ShipId,
    pub tier: Tier,
    pub commodity: Commodity,
    pub location: Location,
    pub creator: String,
}

impl Locatable for Ship {
    fn location(&self) -> Location {
        self.location
    }
}

/// World-owned id counter, safe to share across fabricators and tasks.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds ships for one port. Ids come from the shared generator so they stay
/// unique no matter how many fabricators exist.
#[derive(Debug, Clone)]
pub struct ShipFabricator {
    creator: String,
    ids: Arc<IdGenerator>,
}

impl ShipFabricator {
    pub fn new(port_id: PortId, ids: Arc<IdGenerator>) -> Self {
        Self {
            creator: format!("Port: {}", port_id),
            ids,
        }
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// 隨機貨物種類與船型，貨量裝滿該船型的容量
    pub fn fabricate(&self, location: Location, random: &dyn RandomSource) -> Ship {
        let kind = random.commodity_kind();
        let tier = random.tier();
        self.fabricate_with(location, tier, Commodity::new(kind, tier.cargo_capacity()))
    }

    pub fn fabricate_with(&self, location: Location, tier: Tier, commodity: Commodity) -> Ship {
        Ship {
            id: ShipId(self.ids.next_id()),
            tier,
            commodity,
            location,
            creator: self.creator.clone(),
        }
    }
}
