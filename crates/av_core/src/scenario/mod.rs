//! Simulation setup: parameters, shared resources and world construction.

mod build;
mod params;

pub use build::{build_simulation, prepare_network};
pub use params::{AgentKind, SimHalt, SimRng, SimulationParams, DEFAULT_CHARGE_RATE};
