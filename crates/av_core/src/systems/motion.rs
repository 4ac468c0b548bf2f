//! Motion system: advances every vehicle by one tick and books distance and energy.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::scenario::SimulationParams;
use crate::telemetry::SimStats;
use crate::vehicle::Fleet;

pub fn vehicle_motion_system(
    clock: Res<SimulationClock>,
    params: Res<SimulationParams>,
    mut fleet: ResMut<Fleet>,
    mut stats: ResMut<SimStats>,
) {
    let tick_secs = clock.tick_secs();
    for vehicle in fleet.iter_mut() {
        let outcome = vehicle.on_tick(tick_secs, params.charge_rate);
        stats.record_travel(outcome.distance_m, outcome.energy_used);
        if outcome.completed_ride {
            stats.rides_completed += 1;
        }
    }
}
