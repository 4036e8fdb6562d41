pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{RecordingSink, SeededRandom, TracingSink};
pub use config::{settings::WorldSettings, RunConfig};
pub use core::{RunReport, SimEngine, World, WorldSnapshot};
pub use utils::error::{Result, SimError};
