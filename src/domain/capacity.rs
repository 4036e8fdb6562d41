//! Static capacity tables.
//!
//! One [`Tier`] name selects a different magnitude in each table: cargo a ship
//! can carry, slots a port keeps per tier, and product a port can hold.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Small,
    Middle,
    Big,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Middle, Tier::Big];

    /// 船艙容量
    pub const fn cargo_capacity(self) -> u64 {
        match self {
            Tier::Small => 90,
            Tier::Middle => 180,
            Tier::Big => 360,
        }
    }

    /// 港口每個等級的泊位數
    pub const fn storage_slots(self) -> usize {
        match self {
            Tier::Small => 2,
            Tier::Middle => 4,
            Tier::Big => 8,
        }
    }

    pub const fn port_product_capacity(self) -> u64 {
        self.cargo_capacity() * 4
    }

    pub const fn port_ship_capacity(self) -> usize {
        match self {
            Tier::Small => 4,
            Tier::Middle => 16,
            Tier::Big => 32,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Small => "small",
            Tier::Middle => "middle",
            Tier::Big => "big",
        };
        f.write_str(name)
    }
}

/// Slot counts per tier for one port's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageLayout {
    pub small: usize,
    pub middle: usize,
    pub big: usize,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            small: Tier::Small.storage_slots(),
            middle: Tier::Middle.storage_slots(),
            big: Tier::Big.storage_slots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_independent() {
        assert_eq!(Tier::Small.cargo_capacity(), 90);
        assert_eq!(Tier::Small.storage_slots(), 2);
        assert_eq!(Tier::Small.port_product_capacity(), 360);
        assert_eq!(Tier::Small.port_ship_capacity(), 4);

        assert_eq!(Tier::Big.cargo_capacity(), 360);
        assert_eq!(Tier::Big.storage_slots(), 8);
        assert_eq!(Tier::Big.port_product_capacity(), 1440);
    }

    #[test]
    fn test_default_layout_follows_slot_table() {
        let layout = StorageLayout::default();
        assert_eq!(layout.small, Tier::Small.storage_slots());
        assert_eq!(layout.middle, Tier::Middle.storage_slots());
        assert_eq!(layout.big, Tier::Big.storage_slots());
    }

    #[test]
    fn test_layout_partial_toml() {
        let layout: StorageLayout = toml::from_str("small = 1").unwrap();
        assert_eq!(layout.small, 1);
        assert_eq!(layout.middle, 4);
        assert_eq!(layout.big, 8);
    }
}
