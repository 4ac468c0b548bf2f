//! Trip requests: generation and the FIFO pending queue.

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::prelude::Resource;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::network::{LocationId, RoadNetwork};
use crate::vehicle::VehicleId;

pub const DEFAULT_REQUESTS_PER_HOUR: f64 = 360.0;
pub const DEFAULT_POPULATION: u32 = 430_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripPhase {
    /// Waiting in the queue or for the assigned vehicle to arrive.
    EnRoute,
    /// Rider on board.
    Delivering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub rider_id: u32,
    pub origin: LocationId,
    pub destination: LocationId,
    pub vehicle: Option<VehicleId>,
    pub wait_secs: f64,
    pub requested_tick: u64,
    pub phase: TripPhase,
}

impl TripRequest {
    pub fn new(rider_id: u32, origin: LocationId, destination: LocationId, requested_tick: u64) -> Self {
        Self {
            rider_id,
            origin,
            destination,
            vehicle: None,
            wait_secs: 0.0,
            requested_tick,
            phase: TripPhase::EnRoute,
        }
    }
}

impl fmt::Display for TripRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rider {} from {} to {}",
            self.rider_id, self.origin, self.destination
        )
    }
}

/// Requests not yet taken by dispatch, oldest first.
#[derive(Debug, Clone, Default, Resource)]
pub struct TripRequests {
    pending: VecDeque<TripRequest>,
}

impl TripRequests {
    pub fn push(&mut self, request: TripRequest) {
        self.pending.push_back(request);
    }

    pub fn pop_next(&mut self) -> Option<TripRequest> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TripRequest> {
        self.pending.iter()
    }
}

/// Bernoulli request arrivals.
///
/// The expected number of requests per tick `m = per_hour / 3600 * tick_secs`
/// is spent in unit slices: while `m > 0`, a percentile roll below `m * 100`
/// creates a request, then `m` drops by one. For `m <= 1` that is a single
/// trial with probability `m`.
#[derive(Debug, Clone, Resource)]
pub struct RequestGenerator {
    requests_per_tick: f64,
    population: u32,
}

impl RequestGenerator {
    pub fn new(requests_per_hour: f64, tick_secs: f64, population: u32) -> Self {
        Self {
            requests_per_tick: (requests_per_hour / 3600.0 * tick_secs).max(0.0),
            population: population.max(1),
        }
    }

    pub fn requests_per_tick(&self) -> f64 {
        self.requests_per_tick
    }

    /// One request between two random validated locations, or `None` if the
    /// validated pool is empty.
    pub fn create_request<R: Rng>(
        &self,
        network: &RoadNetwork,
        rng: &mut R,
        tick: u64,
    ) -> Option<TripRequest> {
        let origin = network.random_valid_location(rng)?;
        let destination = network.random_valid_location(rng)?;
        let rider_id = rng.gen_range(0..self.population);
        Some(TripRequest::new(rider_id, origin, destination, tick))
    }

    /// Rolls this tick's arrivals onto `queue`. Returns how many were added.
    pub fn generate<R: Rng>(
        &self,
        network: &RoadNetwork,
        rng: &mut R,
        tick: u64,
        queue: &mut TripRequests,
    ) -> usize {
        let mut remaining = self.requests_per_tick;
        let mut created = 0;
        while remaining > 0.0 {
            let roll = rng.gen_range(0..100u32);
            if f64::from(roll) < remaining * 100.0 {
                match self.create_request(network, rng, tick) {
                    Some(request) => {
                        debug!("generated trip request: {request}");
                        queue.push(request);
                        created += 1;
                    }
                    None => warn!("no validated locations; request dropped"),
                }
            }
            remaining -= 1.0;
        }
        created
    }
}
