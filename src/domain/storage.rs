use crate::domain::capacity::{StorageLayout, Tier};
use crate::domain::ship::Ship;
use thiserror::Error;

/// Placement was refused; the ship is handed back to the caller.
#[derive(Debug, Error)]
#[error("no free {tier} slot for ship {}", ship.id)]
pub struct StorageFull {
    pub tier: Tier,
    pub ship: Ship,
}

/// Three fixed-length slot arrays, one per tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipStorage {
    small: Vec<Option<Ship>>,
    middle: Vec<Option<Ship>>,
    big: Vec<Option<Ship>>,
}

impl ShipStorage {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            small: vec![None; layout.small],
            middle: vec![None; layout.middle],
            big: vec![None; layout.big],
        }
    }

    pub fn slots(&self, tier: Tier) -> &[Option<Ship>] {
        match tier {
            Tier::Small => &self.small,
            Tier::Middle => &self.middle,
            Tier::Big => &self.big,
        }
    }

    fn slots_mut(&mut self, tier: Tier) -> &mut Vec<Option<Ship>> {
        match tier {
            Tier::Small => &mut self.small,
            Tier::Middle => &mut self.middle,
            Tier::Big => &mut self.big,
        }
    }

    /// Docks `ship` in the array of its own tier and returns the slot index.
    ///
    /// The array is first stably sorted so empty slots come first and docked
    /// ships follow in ascending id order, then the first empty slot is taken.
    /// The array never grows.
    pub fn place(&mut self, ship: Ship) -> Result<usize, StorageFull> {
        let tier = ship.tier;
        let slots = self.slots_mut(tier);

        // None 排在 Some 之前，Some 之間依船號遞增
        slots.sort_by_key(|slot| slot.as_ref().map(|docked| docked.id));

        match slots.iter().position(Option::is_none) {
            Some(index) => {
                slots[index] = Some(ship);
                Ok(index)
            }
            None => Err(StorageFull { tier, ship }),
        }
    }

    /// Takes every docked ship out, leaving all slots empty.
    pub fn drain(&mut self) -> Vec<Ship> {
        Tier::ALL
            .into_iter()
            .flat_map(|tier| {
                self.slots_mut(tier)
                    .iter_mut()
                    .filter_map(Option::take)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn docked(&self, tier: Tier) -> usize {
        self.slots(tier).iter().filter(|slot| slot.is_some()).count()
    }

    pub fn total_docked(&self) -> usize {
        Tier::ALL.into_iter().map(|tier| self.docked(tier)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_docked() == 0
    }
}

impl Default for ShipStorage {
    fn default() -> Self {
        Self::new(StorageLayout::default())
    }
}
