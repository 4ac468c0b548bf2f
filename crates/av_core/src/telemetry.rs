//! Run statistics and the end-of-run summary.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Counters accumulated over the run. Inserted as a resource and updated by
/// the motion and dispatch systems.
#[derive(Debug, Clone, Default, Resource)]
pub struct SimStats {
    pub total_distance_m: f64,
    pub total_energy_used: f64,
    pub rides_completed: u64,
    /// Wait time of completed trips, seconds.
    pub total_wait_secs: f64,
    pub failed_routes: u64,
    pub abandoned_requests: u64,
    pub requests_generated: u64,
    pub stuck_vehicle_resets: u64,
    pub evicted_locations: u64,
}

impl SimStats {
    pub fn record_travel(&mut self, distance_m: f64, energy_used: f64) {
        self.total_distance_m += distance_m;
        self.total_energy_used += energy_used;
    }

    pub fn average_wait_secs(&self) -> f64 {
        if self.rides_completed == 0 {
            0.0
        } else {
            self.total_wait_secs / self.rides_completed as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub simulated_hours: f64,
    pub ticks: u64,
    pub total_distance_km: f64,
    pub energy_used: f64,
    pub fleet_size: usize,
    pub rides_completed: u64,
    pub rides_in_progress: usize,
    pub pending_requests: usize,
    pub total_wait_secs: f64,
    pub average_wait_secs: f64,
    pub failed_routes: u64,
    pub abandoned_requests: u64,
}

impl RunSummary {
    /// Human-readable report, one figure per line.
    pub fn report(&self) -> String {
        [
            format!("Simulated {:.2} hours ({} ticks)", self.simulated_hours, self.ticks),
            format!("Total distance driven: {:.3} km", self.total_distance_km),
            format!("Total energy used: {:.3} units of charge", self.energy_used),
            format!("Total cars: {}", self.fleet_size),
            format!("Rides completed: {}", self.rides_completed),
            format!("Rides in progress: {}", self.rides_in_progress),
            format!("Requests pending: {}", self.pending_requests),
            format!(
                "Rider wait: {:.0} s total, {:.1} s average",
                self.total_wait_secs, self.average_wait_secs
            ),
            format!(
                "Failed routes: {}, abandoned requests: {}",
                self.failed_routes, self.abandoned_requests
            ),
        ]
        .join("\n")
    }
}
