use bevy_ecs::prelude::{Res, ResMut};
use log::error;

use crate::clock::SimulationClock;
use crate::connectivity::ConnectivityValidator;
use crate::dispatch::{DispatchContext, DispatchController};
use crate::network::RoadNetwork;
use crate::requests::TripRequests;
use crate::routing::RouteFinder;
use crate::scenario::{AgentKind, SimHalt, SimRng};
use crate::telemetry::SimStats;
use crate::vehicle::Fleet;

/// Run condition: the fleet is under dispatch control.
pub fn fleet_dispatch_enabled(agent: Option<Res<AgentKind>>) -> bool {
    agent.is_some_and(|agent| *agent == AgentKind::FleetDispatch)
}

#[allow(clippy::too_many_arguments)]
pub fn dispatch_system(
    clock: Res<SimulationClock>,
    validator: Res<ConnectivityValidator>,
    mut controller: ResMut<DispatchController>,
    mut network: ResMut<RoadNetwork>,
    mut router: ResMut<RouteFinder>,
    mut fleet: ResMut<Fleet>,
    mut requests: ResMut<TripRequests>,
    mut stats: ResMut<SimStats>,
    mut rng: ResMut<SimRng>,
    mut halt: ResMut<SimHalt>,
) {
    if halt.0.is_some() {
        return;
    }
    let mut ctx = DispatchContext {
        network: &mut network,
        router: &mut router,
        validator: &validator,
        fleet: &mut fleet,
        requests: &mut requests,
        stats: &mut stats,
        rng: &mut rng.0,
        tick_secs: clock.tick_secs(),
    };
    if let Err(err) = controller.tick(&mut ctx) {
        error!("dispatch halted at tick {}: {err}", clock.tick());
        halt.0 = Some(err);
    }
}
