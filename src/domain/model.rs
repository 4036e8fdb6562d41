use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(pub u64);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 二維整數座標，移動時原地修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const ORIGIN: Location = Location { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{} Y:{}", self.x, self.y)
    }
}

/// Anything that sits somewhere on the map: ships, ports and the tunnel.
pub trait Locatable {
    fn location(&self) -> Location;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommodityKind {
    Wood,
    Meat,
    Gold,
}

impl CommodityKind {
    pub const ALL: [CommodityKind; 3] = [CommodityKind::Meat, CommodityKind::Gold, CommodityKind::Wood];
}

impl fmt::Display for CommodityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommodityKind::Wood => "wood",
            CommodityKind::Meat => "meat",
            CommodityKind::Gold => "gold",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    pub kind: CommodityKind,
    pub quantity: u64,
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// 同種貨物：港口庫存由 `before` 變為 `after`
    Transferred { before: u64, after: u64 },
    Mismatch,
}

impl Commodity {
    pub fn new(kind: CommodityKind, quantity: u64) -> Self {
        Self { kind, quantity }
    }

    pub fn same_kind(&self, other: &Commodity) -> bool {
        self.kind == other.kind
    }

    /// Takes a ship's cargo into this stock when the kinds match.
    ///
    /// The stock doubles its own quantity instead of adding the cargo amount
    /// and the cargo is emptied. Kinds that differ leave both untouched.
    pub fn absorb(&mut self, cargo: &mut Commodity) -> UnloadOutcome {
        if !self.same_kind(cargo) {
            return UnloadOutcome::Mismatch;
        }

        let before = self.quantity;
        self.quantity = before.saturating_mul(2);
        cargo.quantity = 0;

        UnloadOutcome::Transferred {
            before,
            after: self.quantity,
        }
    }
}
