//! Simulation runner: builds the tick schedule and advances the clock.
//!
//! Each tick runs request generation, vehicle motion and dispatch in that
//! order, then advances [`SimulationClock`]. A dispatch error parked in
//! [`SimHalt`] ends the run.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use log::info;

use crate::clock::SimulationClock;
use crate::dispatch::DispatchController;
use crate::error::SimResult;
use crate::requests::TripRequests;
use crate::scenario::SimHalt;
use crate::systems::{
    dispatch::{dispatch_system, fleet_dispatch_enabled},
    motion::vehicle_motion_system,
    request_generation::request_generation_system,
};
use crate::telemetry::{RunSummary, SimStats};
use crate::vehicle::Fleet;

pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            request_generation_system,
            vehicle_motion_system,
            dispatch_system.run_if(fleet_dispatch_enabled),
        )
            .chain(),
    );
    schedule
}

/// Runs one tick. Returns the halting error if dispatch hit an invariant violation.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> SimResult<()> {
    schedule.run(world);
    world.resource_mut::<SimulationClock>().advance();
    match world.resource_mut::<SimHalt>().0.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Runs `ticks` ticks. Returns the number actually run.
pub fn run_ticks(world: &mut World, schedule: &mut Schedule, ticks: u64) -> SimResult<u64> {
    let ticks_per_hour = world.resource::<SimulationClock>().ticks_for_hours(1.0).max(1);
    for done in 1..=ticks {
        run_tick(world, schedule)?;
        if done % ticks_per_hour == 0 {
            let stats = world.resource::<SimStats>();
            info!(
                "hour {}: {} rides completed, {:.1} km driven, {} vehicles",
                done / ticks_per_hour,
                stats.rides_completed,
                stats.total_distance_m / 1000.0,
                world.resource::<Fleet>().len()
            );
        }
    }
    Ok(ticks)
}

/// Simulates `hours` of fleet operation on a world prepared by
/// [`crate::scenario::build_simulation`] and returns the run summary.
pub fn simulate_hours(world: &mut World, hours: f64) -> SimResult<RunSummary> {
    let ticks = world.resource::<SimulationClock>().ticks_for_hours(hours);
    info!("simulating {hours} hours ({ticks} ticks)");
    let mut schedule = simulation_schedule();
    run_ticks(world, &mut schedule, ticks)?;
    Ok(summarize(world))
}

/// Snapshot of the run so far.
pub fn summarize(world: &World) -> RunSummary {
    let clock = world.resource::<SimulationClock>();
    let stats = world.resource::<SimStats>();
    RunSummary {
        simulated_hours: clock.elapsed_secs() / 3600.0,
        ticks: clock.tick(),
        total_distance_km: stats.total_distance_m / 1000.0,
        energy_used: stats.total_energy_used,
        fleet_size: world.resource::<Fleet>().len(),
        rides_completed: stats.rides_completed,
        rides_in_progress: world.resource::<DispatchController>().in_progress().len(),
        pending_requests: world.resource::<TripRequests>().len(),
        total_wait_secs: stats.total_wait_secs,
        average_wait_secs: stats.average_wait_secs(),
        failed_routes: stats.failed_routes,
        abandoned_requests: stats.abandoned_requests,
    }
}
