use crate::domain::capacity::Tier;
use crate::domain::events::SimEvent;
use crate::domain::model::{CommodityKind, PortId};
use crate::domain::ship::Ship;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where simulation events go. Implementations must be cheap and non-blocking.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SimEvent);
}

/// The single shared source of every randomized decision.
pub trait RandomSource: Send + Sync {
    /// Uniform value in `[0, bound)`. `bound` must be non-zero.
    fn below(&self, bound: u64) -> u64;

    fn index(&self, len: usize) -> usize {
        self.below(len as u64) as usize
    }

    /// Uniform value in `[low, high)`.
    fn between(&self, low: u64, high: u64) -> u64 {
        low + self.below(high - low)
    }

    fn coordinate(&self, bound: i32) -> i32 {
        self.below(bound.max(1) as u64) as i32
    }

    fn tier(&self) -> Tier {
        Tier::ALL[self.index(Tier::ALL.len())]
    }

    fn commodity_kind(&self) -> CommodityKind {
        CommodityKind::ALL[self.index(CommodityKind::ALL.len())]
    }
}

/// Hands a ship over to the transit machinery.
#[async_trait]
pub trait ShipDispatcher: Send + Sync {
    async fn dispatch(&self, ship: Ship, from: PortId) -> Result<()>;
}
