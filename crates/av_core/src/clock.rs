use bevy_ecs::prelude::Resource;

pub const DEFAULT_TICK_SECS: f64 = 5.0;

/// Fixed-step simulation time. `tick()` is the index of the tick currently
/// being run; the runner advances it after each schedule pass.
#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct SimulationClock {
    tick: u64,
    tick_secs: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_SECS)
    }
}

impl SimulationClock {
    pub fn new(tick_secs: f64) -> Self {
        Self { tick: 0, tick_secs }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_secs(&self) -> f64 {
        self.tick_secs
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.tick as f64 * self.tick_secs
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Whole ticks needed to cover `hours`, rounding a partial tick up.
    pub fn ticks_for_hours(&self, hours: f64) -> u64 {
        if hours <= 0.0 || self.tick_secs <= 0.0 {
            return 0;
        }
        (hours * 3600.0 / self.tick_secs).ceil() as u64
    }
}
