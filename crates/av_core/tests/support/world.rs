#![allow(dead_code)]

use av_core::network::RoadNetwork;
use av_core::scenario::{build_simulation, AgentKind, SimulationParams};
use av_core::test_helpers::cycle_network;
use bevy_ecs::prelude::World;

/// Builds reproducible simulation worlds on synthetic networks.
#[derive(Debug)]
pub struct TestWorldBuilder {
    network: Option<RoadNetwork>,
    params: SimulationParams,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self {
            network: None,
            params: SimulationParams::default().with_seed(42),
        }
    }
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Network to simulate on; defaults to the 4-location cycle.
    pub fn with_network(mut self, network: RoadNetwork) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params = self.params.with_seed(seed);
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.params = self.params.with_agent(agent);
        self
    }

    pub fn with_tick_secs(mut self, tick_secs: f64) -> Self {
        self.params = self.params.with_tick_secs(tick_secs);
        self
    }

    /// Request rate; 0 disables generation so tests can queue requests by hand.
    pub fn with_requests_per_hour(mut self, rate: f64) -> Self {
        self.params = self.params.with_requests_per_hour(rate);
        self
    }

    pub fn with_initial_fleet(mut self, vehicles: usize) -> Self {
        self.params = self.params.with_initial_fleet(vehicles);
        self
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn build(self) -> World {
        let mut world = World::new();
        let network = self.network.unwrap_or_else(cycle_network);
        build_simulation(&mut world, network, self.params).expect("test world builds");
        world
    }
}
