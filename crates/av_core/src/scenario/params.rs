use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::clock::DEFAULT_TICK_SECS;
use crate::connectivity::{DEFAULT_PROBES, DEFAULT_VALIDATION_SEED};
use crate::dispatch::DEFAULT_RECHARGE_BELOW;
use crate::error::SimError;
use crate::requests::{DEFAULT_POPULATION, DEFAULT_REQUESTS_PER_HOUR};
use crate::routing::DEFAULT_ROUTE_CACHE_CAPACITY;

/// Charge units restored per second while charging.
pub const DEFAULT_CHARGE_RATE: f64 = 0.034;

/// Which controller drives the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Resource)]
pub enum AgentKind {
    /// Requests queue up and nothing is dispatched.
    NoDispatch,
    #[default]
    FleetDispatch,
}

/// Shared random source for request generation, vehicle placement and
/// dispatch-time validation probes.
#[derive(Debug, Resource)]
pub struct SimRng(pub StdRng);

/// First invariant violation raised by a system. The runner stops on it.
#[derive(Debug, Default, Resource)]
pub struct SimHalt(pub Option<SimError>);

/// Parameters for building a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct SimulationParams {
    pub agent: AgentKind,
    pub tick_secs: f64,
    pub charge_rate: f64,
    pub requests_per_hour: f64,
    pub population: u32,
    /// Vehicles placed at random validated locations before the first tick.
    pub initial_fleet: usize,
    /// Seed for the shared RNG; entropy when `None`.
    pub seed: Option<u64>,
    pub validation_probes: usize,
    pub validation_seed: u64,
    pub route_cache_capacity: usize,
    /// Idle vehicles below this charge start charging.
    pub recharge_below: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            agent: AgentKind::default(),
            tick_secs: DEFAULT_TICK_SECS,
            charge_rate: DEFAULT_CHARGE_RATE,
            requests_per_hour: DEFAULT_REQUESTS_PER_HOUR,
            population: DEFAULT_POPULATION,
            initial_fleet: 0,
            seed: None,
            validation_probes: DEFAULT_PROBES,
            validation_seed: DEFAULT_VALIDATION_SEED,
            route_cache_capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
            recharge_below: DEFAULT_RECHARGE_BELOW,
        }
    }
}

impl SimulationParams {
    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tick_secs(mut self, tick_secs: f64) -> Self {
        self.tick_secs = tick_secs;
        self
    }

    pub fn with_requests_per_hour(mut self, requests_per_hour: f64) -> Self {
        self.requests_per_hour = requests_per_hour;
        self
    }

    pub fn with_initial_fleet(mut self, vehicles: usize) -> Self {
        self.initial_fleet = vehicles;
        self
    }

    pub fn with_charge_rate(mut self, charge_rate: f64) -> Self {
        self.charge_rate = charge_rate;
        self
    }

    pub fn with_validation(mut self, probes: usize, seed: u64) -> Self {
        self.validation_probes = probes;
        self.validation_seed = seed;
        self
    }

    pub fn with_route_cache_capacity(mut self, capacity: usize) -> Self {
        self.route_cache_capacity = capacity;
        self
    }

    pub fn with_recharge_below(mut self, energy: f64) -> Self {
        self.recharge_below = energy;
        self
    }
}
