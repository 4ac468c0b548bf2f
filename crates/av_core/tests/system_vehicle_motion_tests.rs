mod support;

use av_core::requests::{TripRequest, TripRequests};
use av_core::telemetry::SimStats;
use av_core::test_helpers::grid_network;
use av_core::vehicle::{Fleet, VehicleId, VehicleState, DEFAULT_EFFICIENCY, MAX_ENERGY};
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

#[test]
fn energy_for_a_ride_does_not_depend_on_tick_length() {
    // 650 m line; the vehicle starts at the pickup.
    let expected_m = 650.0;
    for tick_secs in [0.5, 1.0, 5.0, 7.3, 30.0] {
        let mut world = TestWorldBuilder::new()
            .with_network(grid_network(6, 1, 130.0))
            .with_tick_secs(tick_secs)
            .with_requests_per_hour(0.0)
            .build();
        let vehicle = world.resource_mut::<Fleet>().spawn(0);
        world
            .resource_mut::<TripRequests>()
            .push(TripRequest::new(1, 0, 5, 0));

        let mut runner = ScheduleRunner::new();
        runner.run_until(&mut world, 10_000, |w| w.resource::<SimStats>().rides_completed == 1);

        let stats = world.resource::<SimStats>();
        assert!((stats.total_distance_m - expected_m).abs() < 1e-9, "tick {tick_secs}");
        assert!(
            (stats.total_energy_used - expected_m / DEFAULT_EFFICIENCY).abs() < 1e-12,
            "tick {tick_secs}: {}",
            stats.total_energy_used
        );
        let fleet = world.resource::<Fleet>();
        let vehicle = fleet.get(vehicle).expect("vehicle");
        assert_eq!(vehicle.location(), 5);
        assert_eq!(vehicle.state(), VehicleState::Idle);
        assert!((vehicle.energy() - (MAX_ENERGY - expected_m / DEFAULT_EFFICIENCY)).abs() < 1e-9);
        assert!((vehicle.odometer_m() - expected_m).abs() < 1e-9);
        assert!((vehicle.energy_used() - expected_m / vehicle.efficiency()).abs() < 1e-12);
    }
}

#[test]
fn ride_takes_as_many_ticks_as_the_route_needs() {
    // 650 m at 10 m/s is 65 s: 13 ticks of 5 s.
    let mut world = TestWorldBuilder::new()
        .with_network(grid_network(6, 1, 130.0))
        .with_requests_per_hour(0.0)
        .build();
    world.resource_mut::<Fleet>().spawn(0);
    world
        .resource_mut::<TripRequests>()
        .push(TripRequest::new(1, 0, 5, 0));

    let ticks = ScheduleRunner::new().run_until(&mut world, 100, |w| {
        w.resource::<SimStats>().rides_completed == 1
    });
    // Dispatch starts the trip at the end of tick 1; motion begins on tick 2.
    assert_eq!(ticks, 14);
    assert_eq!(
        world.resource::<Fleet>().get(VehicleId(0)).map(|v| v.state()),
        Some(VehicleState::Idle)
    );
}
