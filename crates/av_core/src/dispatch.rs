//! Fleet dispatch: assigns vehicles to requests and moves trips through their phases.
//!
//! Each tick runs two passes:
//!
//! 1. **Intake** drains the pending queue. Every request goes to the idle
//!    vehicle with the quickest route to the pickup, or to a new vehicle when
//!    none is idle. A request whose pickup or delivery cannot be routed is
//!    abandoned after the locations involved are checked: a vehicle stranded
//!    on an island is reset, and pickup or destination locations that fail
//!    validation are evicted from the pool so they are not drawn again.
//! 2. **Progress** walks the in-progress trips: vehicles that reached a
//!    rider get the delivery route, and trips whose vehicle finished
//!    delivering are retired with their wait time.

use bevy_ecs::prelude::Resource;
use log::warn;
use rand::rngs::StdRng;

use crate::connectivity::ConnectivityValidator;
use crate::error::{SimError, SimResult};
use crate::network::{LocationId, RoadNetwork};
use crate::requests::{TripPhase, TripRequest, TripRequests};
use crate::routing::RouteFinder;
use crate::search::Metric;
use crate::telemetry::SimStats;
use crate::vehicle::{Fleet, Vehicle, VehicleId, VehicleState};

/// Idle vehicles below this charge are sent to charge in place.
pub const DEFAULT_RECHARGE_BELOW: f64 = 10.0;

/// Mutable simulation state dispatch works on during one tick.
pub struct DispatchContext<'a> {
    pub network: &'a mut RoadNetwork,
    pub router: &'a mut RouteFinder,
    pub validator: &'a ConnectivityValidator,
    pub fleet: &'a mut Fleet,
    pub requests: &'a mut TripRequests,
    pub stats: &'a mut SimStats,
    pub rng: &'a mut StdRng,
    pub tick_secs: f64,
}

#[derive(Debug, Clone, Resource)]
pub struct DispatchController {
    in_progress: Vec<TripRequest>,
    recharge_below: f64,
}

impl Default for DispatchController {
    fn default() -> Self {
        Self::new(DEFAULT_RECHARGE_BELOW)
    }
}

impl DispatchController {
    pub fn new(recharge_below: f64) -> Self {
        Self {
            in_progress: Vec::new(),
            recharge_below,
        }
    }

    /// Trips assigned to a vehicle and not yet delivered, in assignment order.
    pub fn in_progress(&self) -> &[TripRequest] {
        &self.in_progress
    }

    pub fn tick(&mut self, ctx: &mut DispatchContext<'_>) -> SimResult<()> {
        self.intake(ctx)?;
        self.progress(ctx)?;
        self.send_low_vehicles_to_charge(ctx);
        Ok(())
    }

    pub fn intake(&mut self, ctx: &mut DispatchContext<'_>) -> SimResult<()> {
        while let Some(request) = ctx.requests.pop_next() {
            self.assign(request, ctx)?;
        }
        Ok(())
    }

    fn assign(&mut self, mut request: TripRequest, ctx: &mut DispatchContext<'_>) -> SimResult<()> {
        let Some((vehicle_id, pickup_path)) = choose_vehicle(&request, ctx)? else {
            warn!("no validated location to place a vehicle; abandoning {request}");
            ctx.stats.abandoned_requests += 1;
            return Ok(());
        };

        if pickup_path.is_empty() {
            let vehicle_location = vehicle_location(ctx.fleet, vehicle_id)?;
            if !ctx
                .validator
                .is_connected(vehicle_location, ctx.network, ctx.router, ctx.rng)?
            {
                warn!(
                    "{}",
                    SimError::StuckVehicle {
                        vehicle: vehicle_id,
                        location: vehicle_location
                    }
                );
                let vehicle = vehicle_mut(ctx.fleet, vehicle_id)?;
                if !vehicle.reset(ctx.network, ctx.rng) {
                    warn!("vehicle {vehicle_id} could not be relocated: validated pool is empty");
                }
                ctx.stats.stuck_vehicle_resets += 1;
            }
            evict_if_disconnected(request.origin, ctx)?;
            warn!(
                "{}; abandoning {request}",
                SimError::NoPathFound {
                    from: vehicle_location,
                    to: request.origin
                }
            );
            ctx.stats.abandoned_requests += 1;
            return Ok(());
        }

        let delivery = ctx
            .router
            .find_route(ctx.network, request.origin, request.destination, Metric::Time)?;
        if delivery.is_empty() {
            evict_if_disconnected(request.origin, ctx)?;
            evict_if_disconnected(request.destination, ctx)?;
            warn!(
                "{}; abandoning {request}",
                SimError::NoPathFound {
                    from: request.origin,
                    to: request.destination
                }
            );
            ctx.stats.abandoned_requests += 1;
            return Ok(());
        }

        vehicle_mut(ctx.fleet, vehicle_id)?.pick_up_rider(ctx.network, &pickup_path)?;
        request.vehicle = Some(vehicle_id);
        self.in_progress.push(request);
        Ok(())
    }

    pub fn progress(&mut self, ctx: &mut DispatchContext<'_>) -> SimResult<()> {
        let mut outcome = Ok(());
        self.in_progress.retain_mut(|trip| {
            if outcome.is_err() {
                return true;
            }
            match advance_trip(trip, ctx) {
                Ok(keep) => keep,
                Err(err) => {
                    outcome = Err(err);
                    true
                }
            }
        });
        outcome
    }

    fn send_low_vehicles_to_charge(&self, ctx: &mut DispatchContext<'_>) {
        for vehicle in ctx.fleet.iter_mut() {
            if vehicle.state() == VehicleState::Idle && vehicle.energy() < self.recharge_below {
                vehicle.start_charging();
            }
        }
    }
}

/// Moves one trip along. Returns whether the trip stays in progress.
fn advance_trip(trip: &mut TripRequest, ctx: &mut DispatchContext<'_>) -> SimResult<bool> {
    let vehicle_id = trip
        .vehicle
        .ok_or_else(|| SimError::InvariantViolation(format!("trip for {trip} has no vehicle")))?;

    if trip.phase == TripPhase::EnRoute {
        trip.wait_secs += ctx.tick_secs;
        let state = vehicle_mut(ctx.fleet, vehicle_id)?.state();
        match state {
            VehicleState::AwaitingRider => {
                let path = ctx
                    .router
                    .find_route(ctx.network, trip.origin, trip.destination, Metric::Time)?;
                let vehicle = vehicle_mut(ctx.fleet, vehicle_id)?;
                if path.is_empty() {
                    vehicle.cancel_route();
                    ctx.stats.failed_routes += 1;
                    warn!("failed to find a delivery route after pickup for {trip}");
                    return Ok(false);
                }
                trip.phase = TripPhase::Delivering;
                if vehicle.begin_trip(ctx.network, &path)? {
                    ctx.stats.rides_completed += 1;
                }
            }
            VehicleState::Idle => {
                warn!("vehicle {vehicle_id} went idle before picking up {trip}");
                ctx.stats.failed_routes += 1;
                return Ok(false);
            }
            _ => {}
        }
    }

    if trip.phase == TripPhase::Delivering
        && vehicle_mut(ctx.fleet, vehicle_id)?.state() != VehicleState::Transporting
    {
        ctx.stats.total_wait_secs += trip.wait_secs;
        return Ok(false);
    }
    Ok(true)
}

/// Idle vehicle with the quickest pickup route, ties broken by fleet order.
/// When no vehicle is idle a new one is placed at a random validated
/// location. The returned path is empty when the pickup is unreachable.
fn choose_vehicle(
    request: &TripRequest,
    ctx: &mut DispatchContext<'_>,
) -> SimResult<Option<(VehicleId, Vec<LocationId>)>> {
    let idle: Vec<(VehicleId, LocationId)> = ctx
        .fleet
        .iter()
        .filter(|v| v.state() == VehicleState::Idle)
        .map(|v| (v.id(), v.location()))
        .collect();

    let mut best: Option<(VehicleId, Vec<LocationId>, f64)> = None;
    for (id, location) in idle {
        let path = ctx
            .router
            .find_route(ctx.network, location, request.origin, Metric::Time)?;
        let cost = if path.is_empty() {
            f64::INFINITY
        } else {
            Metric::Time.path_cost(ctx.network, &path)
        };
        let better = best.as_ref().map_or(true, |(_, _, best_cost)| cost < *best_cost);
        if better {
            best = Some((id, path, cost));
        }
    }
    if let Some((id, path, _)) = best {
        return Ok(Some((id, path)));
    }

    let Some(location) = ctx.network.random_valid_location(ctx.rng) else {
        return Ok(None);
    };
    let id = ctx.fleet.spawn(location);
    let path = ctx
        .router
        .find_route(ctx.network, location, request.origin, Metric::Time)?;
    Ok(Some((id, path)))
}

fn evict_if_disconnected(location: LocationId, ctx: &mut DispatchContext<'_>) -> SimResult<()> {
    if ctx
        .validator
        .is_connected(location, ctx.network, ctx.router, ctx.rng)?
    {
        return Ok(());
    }
    if ctx.network.remove_valid_location(location) {
        ctx.stats.evicted_locations += 1;
        warn!("{}; evicted from the validated pool", SimError::DisconnectedLocation(location));
    }
    Ok(())
}

fn vehicle_location(fleet: &Fleet, id: VehicleId) -> SimResult<LocationId> {
    fleet
        .get(id)
        .map(|v| v.location())
        .ok_or_else(|| SimError::InvariantViolation(format!("unknown vehicle {id}")))
}

fn vehicle_mut(fleet: &mut Fleet, id: VehicleId) -> SimResult<&mut Vehicle> {
    fleet
        .get_mut(id)
        .ok_or_else(|| SimError::InvariantViolation(format!("unknown vehicle {id}")))
}
