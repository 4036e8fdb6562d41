// Adapters layer: concrete implementations of the domain seams
// (event sinks, random sources).

pub mod rng;
pub mod sink;

pub use rng::SeededRandom;
pub use sink::{RecordingSink, TracingSink};
