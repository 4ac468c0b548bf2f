//! Vehicle state machine: travel along resolved paths, energy use and charging.

use std::fmt;

use bevy_ecs::prelude::Resource;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::{kph_to_mps, Connection, LocationId, RoadNetwork};

/// Full battery, in units of charge.
pub const MAX_ENERGY: f64 = 100.0;
/// Metres driven per unit of charge.
pub const DEFAULT_EFFICIENCY: f64 = 6500.0;
const RANGE_RESERVE_FACTOR: f64 = 0.9;

/// Index of a vehicle in the [`Fleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleState {
    Idle,
    Charging,
    PickingUpRider,
    Transporting,
    AwaitingRider,
}

/// What one tick did to a vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub distance_m: f64,
    pub energy_used: f64,
    pub completed_ride: bool,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    location: LocationId,
    state: VehicleState,
    energy: f64,
    efficiency: f64,
    path: Vec<Connection>,
    hop_index: usize,
    remaining_on_hop: f64,
    odometer_m: f64,
    energy_used: f64,
    rides_completed: u64,
    trip_log: Vec<String>,
}

impl Vehicle {
    pub fn new(id: VehicleId, location: LocationId) -> Self {
        Self::with_energy(id, location, MAX_ENERGY, DEFAULT_EFFICIENCY)
    }

    pub fn with_energy(id: VehicleId, location: LocationId, energy: f64, efficiency: f64) -> Self {
        Self {
            id,
            location,
            state: VehicleState::Idle,
            energy: energy.clamp(0.0, MAX_ENERGY),
            efficiency,
            path: Vec::new(),
            hop_index: 0,
            remaining_on_hop: 0.0,
            odometer_m: 0.0,
            energy_used: 0.0,
            rides_completed: 0,
            trip_log: Vec::new(),
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn odometer_m(&self) -> f64 {
        self.odometer_m
    }

    pub fn energy_used(&self) -> f64 {
        self.energy_used
    }

    pub fn rides_completed(&self) -> u64 {
        self.rides_completed
    }

    /// Labels of the hops driven on the current path.
    pub fn trip_log(&self) -> &[String] {
        &self.trip_log
    }

    /// Hops left on the current path, including the one in progress.
    pub fn remaining_hops(&self) -> &[Connection] {
        self.path.get(self.hop_index..).unwrap_or(&[])
    }

    /// Metres left on the hop in progress.
    pub fn remaining_on_hop(&self) -> f64 {
        self.remaining_on_hop
    }

    /// Distance the vehicle believes it can still cover, keeping a 10% reserve.
    pub fn remaining_range(&self) -> f64 {
        self.efficiency * self.energy * RANGE_RESERVE_FACTOR
    }

    pub fn can_do_route(&self, network: &RoadNetwork, path: &[LocationId]) -> bool {
        network.path_length(path) <= self.remaining_range()
    }

    /// Heads for a pickup. A single-location path means the vehicle is
    /// already there and goes straight to `AwaitingRider`.
    pub fn pick_up_rider(&mut self, network: &RoadNetwork, path: &[LocationId]) -> SimResult<()> {
        self.expect_state(VehicleState::Idle, "pick_up_rider")?;
        self.load_path(network, path)?;
        self.state = if self.path.is_empty() {
            VehicleState::AwaitingRider
        } else {
            VehicleState::PickingUpRider
        };
        Ok(())
    }

    /// Starts the delivery leg. Returns `true` when the path is a single
    /// location and the ride therefore completes immediately.
    pub fn begin_trip(&mut self, network: &RoadNetwork, path: &[LocationId]) -> SimResult<bool> {
        self.expect_state(VehicleState::AwaitingRider, "begin_trip")?;
        self.load_path(network, path)?;
        if self.path.is_empty() {
            self.finish_ride();
            return Ok(true);
        }
        self.state = VehicleState::Transporting;
        Ok(false)
    }

    /// Drops the current path and returns to `Idle` where the vehicle stands.
    pub fn cancel_route(&mut self) {
        self.clear_path();
        self.trip_log.clear();
        self.state = VehicleState::Idle;
    }

    /// Idle vehicles only; others keep their state. Returns whether charging started.
    pub fn start_charging(&mut self) -> bool {
        if self.state != VehicleState::Idle {
            return false;
        }
        self.state = VehicleState::Charging;
        true
    }

    /// Teleports the vehicle to a random validated location with a full
    /// battery. Returns `false` (vehicle left in place) if the pool is empty.
    pub fn reset<R: Rng>(&mut self, network: &RoadNetwork, rng: &mut R) -> bool {
        self.cancel_route();
        self.energy = MAX_ENERGY;
        match network.random_valid_location(rng) {
            Some(location) => {
                self.location = location;
                true
            }
            None => false,
        }
    }

    /// Advances the vehicle by one tick.
    pub fn on_tick(&mut self, tick_secs: f64, charge_rate: f64) -> TickOutcome {
        match self.state {
            VehicleState::Idle | VehicleState::AwaitingRider => TickOutcome::default(),
            VehicleState::Charging => {
                self.charge(tick_secs * charge_rate);
                TickOutcome::default()
            }
            VehicleState::PickingUpRider | VehicleState::Transporting => self.drive_for(tick_secs),
        }
    }

    fn charge(&mut self, amount: f64) {
        self.energy += amount;
        if self.energy >= MAX_ENERGY {
            self.energy = MAX_ENERGY;
            self.state = VehicleState::Idle;
        }
    }

    fn drive_for(&mut self, secs: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let mut time_left = secs;
        while time_left > 0.0 {
            let Some(hop) = self.path.get(self.hop_index) else {
                break;
            };
            let speed = kph_to_mps(hop.max_speed_kph);
            if speed <= 0.0 {
                break;
            }
            let reach = speed * time_left;
            if self.remaining_on_hop > reach {
                self.remaining_on_hop -= reach;
                self.consume(reach, &mut outcome);
                break;
            }

            let driven = self.remaining_on_hop;
            time_left -= driven / speed;
            self.location = hop.target;
            self.trip_log.push(hop.attributes.label().to_owned());
            self.consume(driven, &mut outcome);
            self.hop_index += 1;
            match self.path.get(self.hop_index) {
                Some(next) => self.remaining_on_hop = next.length_m,
                None => {
                    outcome.completed_ride = self.finish_path();
                    break;
                }
            }
        }
        outcome
    }

    fn consume(&mut self, metres: f64, outcome: &mut TickOutcome) {
        let used = metres / self.efficiency;
        self.energy = (self.energy - used).max(0.0);
        self.odometer_m += metres;
        self.energy_used += used;
        outcome.distance_m += metres;
        outcome.energy_used += used;
    }

    /// End of the current path. Returns whether a ride completed.
    fn finish_path(&mut self) -> bool {
        self.clear_path();
        match self.state {
            VehicleState::PickingUpRider => {
                self.state = VehicleState::AwaitingRider;
                false
            }
            VehicleState::Transporting => {
                self.finish_ride();
                true
            }
            _ => false,
        }
    }

    fn finish_ride(&mut self) {
        debug!(
            "vehicle {} dropped off at {} via [{}]",
            self.id,
            self.location,
            self.trip_log.join(", ")
        );
        self.trip_log.clear();
        self.clear_path();
        self.rides_completed += 1;
        self.state = VehicleState::Idle;
    }

    fn load_path(&mut self, network: &RoadNetwork, path: &[LocationId]) -> SimResult<()> {
        match path.first() {
            Some(&first) if first == self.location => {}
            Some(&first) => {
                return Err(SimError::InvariantViolation(format!(
                    "vehicle {} at {} given a path starting at {first}",
                    self.id, self.location
                )))
            }
            None => {
                return Err(SimError::InvariantViolation(format!(
                    "vehicle {} given an empty path",
                    self.id
                )))
            }
        }
        self.path = network.travel_path(path)?;
        self.hop_index = 0;
        self.remaining_on_hop = self.path.first().map_or(0.0, |hop| hop.length_m);
        Ok(())
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.hop_index = 0;
        self.remaining_on_hop = 0.0;
    }

    fn expect_state(&self, expected: VehicleState, action: &str) -> SimResult<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(SimError::InvariantViolation(format!(
            "vehicle {} cannot {action} while {:?}",
            self.id, self.state
        )))
    }
}

/// All vehicles of the simulation, indexed by [`VehicleId`]. Vehicles are
/// never removed, so ids stay valid for the whole run.
#[derive(Debug, Clone, Default, Resource)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
}

impl Fleet {
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn spawn(&mut self, location: LocationId) -> VehicleId {
        let id = VehicleId(self.vehicles.len());
        self.vehicles.push(Vehicle::new(id, location));
        id
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.vehicles.iter_mut()
    }

    pub fn count_in(&self, state: VehicleState) -> usize {
        self.vehicles.iter().filter(|v| v.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{cycle_network, grid_network};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pickup_at_own_location_awaits_rider() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 1);
        vehicle.pick_up_rider(&network, &[1]).expect("pickup");
        assert_eq!(vehicle.state(), VehicleState::AwaitingRider);
    }

    #[test]
    fn pickup_then_trip_runs_the_full_cycle() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 1);
        vehicle.pick_up_rider(&network, &[1, 2]).expect("pickup");
        assert_eq!(vehicle.state(), VehicleState::PickingUpRider);

        // 100 m at 10 m/s: two 5 s ticks.
        assert!(!vehicle.on_tick(5.0, 0.0).completed_ride);
        assert_eq!(vehicle.location(), 1);
        vehicle.on_tick(5.0, 0.0);
        assert_eq!(vehicle.location(), 2);
        assert_eq!(vehicle.state(), VehicleState::AwaitingRider);

        let immediate = vehicle.begin_trip(&network, &[2, 3, 4]).expect("trip");
        assert!(!immediate);
        assert_eq!(vehicle.state(), VehicleState::Transporting);
        let mut completed = 0;
        for _ in 0..4 {
            if vehicle.on_tick(5.0, 0.0).completed_ride {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
        assert_eq!(vehicle.location(), 4);
        assert_eq!(vehicle.state(), VehicleState::Idle);
        assert_eq!(vehicle.rides_completed(), 1);
        assert!((vehicle.odometer_m() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn single_location_trip_completes_immediately() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 3);
        vehicle.pick_up_rider(&network, &[3]).expect("pickup");
        assert!(vehicle.begin_trip(&network, &[3]).expect("trip"));
        assert_eq!(vehicle.state(), VehicleState::Idle);
        assert_eq!(vehicle.rides_completed(), 1);
    }

    #[test]
    fn leftover_tick_time_carries_onto_the_next_hop() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 1);
        vehicle.pick_up_rider(&network, &[1, 2, 3]).expect("pickup");
        // 15 s at 10 m/s covers hop 1->2 and half of 2->3.
        let outcome = vehicle.on_tick(15.0, 0.0);
        assert_eq!(vehicle.location(), 2);
        assert!((outcome.distance_m - 150.0).abs() < 1e-9);
        assert!((vehicle.remaining_on_hop() - 50.0).abs() < 1e-9);
        assert_eq!(vehicle.remaining_hops().len(), 1);
    }

    #[test]
    fn energy_use_is_independent_of_tick_size() {
        let network = grid_network(4, 1, 130.0);
        let path = [0, 1, 2, 3];
        let expected = network.path_length(&path) / DEFAULT_EFFICIENCY;

        for tick in [1.0, 3.7, 5.0, 60.0] {
            let mut vehicle = Vehicle::new(VehicleId(0), 0);
            vehicle.pick_up_rider(&network, &path).expect("pickup");
            let mut used = 0.0;
            while vehicle.state() == VehicleState::PickingUpRider {
                used += vehicle.on_tick(tick, 0.0).energy_used;
            }
            assert!((used - expected).abs() < 1e-12, "tick {tick}: {used} vs {expected}");
            assert!((vehicle.energy() - (MAX_ENERGY - expected)).abs() < 1e-9);
        }
    }

    #[test]
    fn can_do_route_threshold() {
        let network = grid_network(3, 1, 90.0);
        // Range 10 m/unit * 20 units * 0.9 = 180 m, exactly the two-hop path.
        let exact = Vehicle::with_energy(VehicleId(0), 0, 20.0, 10.0);
        assert_eq!(exact.remaining_range(), 180.0);
        assert!(exact.can_do_route(&network, &[0, 1, 2]));
        let short = Vehicle::with_energy(VehicleId(0), 0, 19.9, 10.0);
        assert!(!short.can_do_route(&network, &[0, 1, 2]));
        assert!(short.can_do_route(&network, &[0, 1]));
    }

    #[test]
    fn charging_clamps_and_returns_to_idle() {
        let mut vehicle = Vehicle::with_energy(VehicleId(0), 1, 99.9, DEFAULT_EFFICIENCY);
        assert!(vehicle.start_charging());
        vehicle.on_tick(1.0, 0.034);
        assert_eq!(vehicle.state(), VehicleState::Charging);
        vehicle.on_tick(5.0, 0.034);
        assert_eq!(vehicle.energy(), MAX_ENERGY);
        assert_eq!(vehicle.state(), VehicleState::Idle);
    }

    #[test]
    fn cancel_and_reset_clear_the_path() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 1);
        vehicle.pick_up_rider(&network, &[1, 2, 3]).expect("pickup");
        vehicle.on_tick(12.0, 0.0);
        vehicle.cancel_route();
        assert_eq!(vehicle.state(), VehicleState::Idle);
        assert!(vehicle.remaining_hops().is_empty());
        assert_eq!(vehicle.location(), 2);

        let mut rng = StdRng::seed_from_u64(9);
        assert!(vehicle.reset(&network, &mut rng));
        assert_eq!(vehicle.energy(), MAX_ENERGY);
        assert!(network.is_valid_location(vehicle.location()));
    }

    #[test]
    fn path_must_start_at_the_vehicle() {
        let network = cycle_network();
        let mut vehicle = Vehicle::new(VehicleId(0), 1);
        assert!(matches!(
            vehicle.pick_up_rider(&network, &[2, 3]),
            Err(SimError::InvariantViolation(_))
        ));
        assert!(matches!(
            vehicle.begin_trip(&network, &[1]),
            Err(SimError::InvariantViolation(_))
        ));
    }

    #[test]
    fn fleet_ids_are_indices() {
        let mut fleet = Fleet::default();
        let a = fleet.spawn(1);
        let b = fleet.spawn(3);
        assert_eq!((a, b), (VehicleId(0), VehicleId(1)));
        assert_eq!(fleet.get(b).map(Vehicle::location), Some(3));
        assert_eq!(fleet.count_in(VehicleState::Idle), 2);
    }
}
