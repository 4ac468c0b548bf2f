use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::network::RoadNetwork;
use crate::requests::{RequestGenerator, TripRequests};
use crate::scenario::SimRng;
use crate::telemetry::SimStats;

pub fn request_generation_system(
    generator: Res<RequestGenerator>,
    network: Res<RoadNetwork>,
    clock: Res<SimulationClock>,
    mut rng: ResMut<SimRng>,
    mut requests: ResMut<TripRequests>,
    mut stats: ResMut<SimStats>,
) {
    let created = generator.generate(&network, &mut rng.0, clock.tick(), &mut requests);
    stats.requests_generated += created as u64;
}
