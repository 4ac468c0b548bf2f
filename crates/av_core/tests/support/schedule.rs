#![allow(dead_code)]

use av_core::error::SimResult;
use av_core::runner::{run_tick, run_ticks, simulation_schedule};
use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;

/// Owns a reusable tick schedule so tests can step the simulation.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    pub fn run_one(&mut self, world: &mut World) -> SimResult<()> {
        run_tick(world, &mut self.schedule)
    }

    pub fn run_ticks(&mut self, world: &mut World, ticks: u64) -> SimResult<u64> {
        run_ticks(world, &mut self.schedule, ticks)
    }

    /// Step until `done` holds or `max_ticks` have run. Returns the ticks run.
    pub fn run_until<F>(&mut self, world: &mut World, max_ticks: u64, mut done: F) -> u64
    where
        F: FnMut(&World) -> bool,
    {
        let mut ticks = 0;
        while ticks < max_ticks && !done(world) {
            self.run_one(world).expect("tick");
            ticks += 1;
        }
        ticks
    }
}
