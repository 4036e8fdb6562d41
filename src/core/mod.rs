pub mod engine;
pub mod lifecycle;
pub mod movement;
pub mod port;
pub mod transit;
pub mod tunnel;
pub mod world;

pub use crate::domain::ports::{EventSink, RandomSource, ShipDispatcher};
pub use crate::utils::error::Result;
pub use engine::{RunReport, SimEngine, StopReason};
pub use world::{World, WorldSnapshot};
