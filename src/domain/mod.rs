// Domain layer: world entities, capacity tables, events and the seams (traits)
// the core depends on. Nothing here spawns tasks or sleeps.

pub mod capacity;
pub mod events;
pub mod model;
pub mod ports;
pub mod ship;
pub mod storage;
