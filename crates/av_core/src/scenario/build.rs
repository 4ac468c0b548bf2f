use bevy_ecs::prelude::World;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::SimulationClock;
use crate::connectivity::ConnectivityValidator;
use crate::dispatch::DispatchController;
use crate::error::{SimError, SimResult};
use crate::network::RoadNetwork;
use crate::requests::{RequestGenerator, TripRequests};
use crate::routing::RouteFinder;
use crate::telemetry::SimStats;
use crate::valid_store::ValidLocationStore;
use crate::vehicle::Fleet;

use super::params::{SimHalt, SimRng, SimulationParams};

/// Fills the network's validated pool from `store`, validating and saving
/// when the store has no entry for this network. Returns the pool size.
pub fn prepare_network(
    network: &mut RoadNetwork,
    params: &SimulationParams,
    store: &mut dyn ValidLocationStore,
) -> SimResult<usize> {
    let validator = ConnectivityValidator::new(params.validation_probes, params.validation_seed);
    let mut router = RouteFinder::with_capacity(params.route_cache_capacity);
    validator.prepare_network(network, &mut router, store)
}

fn check_params(params: &SimulationParams) -> SimResult<()> {
    if !(params.tick_secs.is_finite() && params.tick_secs > 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "tick length must be positive, got {}",
            params.tick_secs
        )));
    }
    if !(params.requests_per_hour.is_finite() && params.requests_per_hour >= 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "request rate must be non-negative, got {}",
            params.requests_per_hour
        )));
    }
    if params.charge_rate < 0.0 {
        return Err(SimError::InvalidConfig(format!(
            "charge rate must be non-negative, got {}",
            params.charge_rate
        )));
    }
    Ok(())
}

/// Inserts every simulation resource into `world`. The network's validated
/// pool should already be filled (see [`prepare_network`]).
pub fn build_simulation(
    world: &mut World,
    network: RoadNetwork,
    params: SimulationParams,
) -> SimResult<()> {
    check_params(&params)?;
    if network.valid_locations().is_empty() {
        warn!(
            "network '{}' has no validated locations; no requests will be generated",
            network.source()
        );
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut fleet = Fleet::default();
    for _ in 0..params.initial_fleet {
        let location = network.random_valid_location(&mut rng).ok_or_else(|| {
            SimError::InvalidConfig(format!(
                "cannot place {} vehicles: no validated locations",
                params.initial_fleet
            ))
        })?;
        fleet.spawn(location);
    }

    info!(
        "simulation on '{}': {} locations ({} validated), {} vehicles, {:?}, {} s ticks",
        network.source(),
        network.location_count(),
        network.valid_locations().len(),
        fleet.len(),
        params.agent,
        params.tick_secs
    );

    world.insert_resource(SimulationClock::new(params.tick_secs));
    world.insert_resource(RequestGenerator::new(
        params.requests_per_hour,
        params.tick_secs,
        params.population,
    ));
    world.insert_resource(TripRequests::default());
    world.insert_resource(fleet);
    world.insert_resource(DispatchController::new(params.recharge_below));
    world.insert_resource(SimStats::default());
    world.insert_resource(RouteFinder::with_capacity(params.route_cache_capacity));
    world.insert_resource(ConnectivityValidator::new(
        params.validation_probes,
        params.validation_seed,
    ));
    world.insert_resource(network);
    world.insert_resource(SimRng(rng));
    world.insert_resource(SimHalt::default());
    world.insert_resource(params.agent);
    world.insert_resource(params);
    Ok(())
}
