//! Synthetic road networks for tests and benchmarks.
//!
//! Every network here uses 36 km/h (10 m/s) connections so travel times are
//! easy to reason about, and has all of its locations in the validated pool.

use crate::network::{Connection, LocationId, Position, RoadNetwork};

pub const TEST_SPEED_KPH: f64 = 36.0;

/// Location with no connections in [`isolated_pickup_network`].
pub const ISOLATED_LOCATION: LocationId = 99;

fn link(network: &mut RoadNetwork, a: LocationId, b: LocationId, length_m: f64) {
    network
        .add_two_way(Connection::new(a, b, length_m, TEST_SPEED_KPH))
        .expect("test network endpoints exist");
}

fn validate_all(network: &mut RoadNetwork) {
    let ids = network.location_ids().to_vec();
    network.set_valid_locations(ids);
}

/// Square A-B-C-D-A with ids 1..=4, two-way sides of 100 m.
///
/// # Panics
///
/// Panics if a connection endpoint is missing (the locations are added first).
pub fn cycle_network() -> RoadNetwork {
    let mut network = RoadNetwork::new("cycle");
    network.add_location(1, Position::new(0.0, 0.0));
    network.add_location(2, Position::new(100.0, 0.0));
    network.add_location(3, Position::new(100.0, 100.0));
    network.add_location(4, Position::new(0.0, 100.0));
    for (a, b) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
        link(&mut network, a, b, 100.0);
    }
    validate_all(&mut network);
    network
}

/// `width` x `height` lattice, ids row-major from 0, two-way links of `spacing` metres.
pub fn grid_network(width: usize, height: usize, spacing: f64) -> RoadNetwork {
    let mut network = RoadNetwork::new(format!("grid-{width}x{height}"));
    let id = |col: usize, row: usize| (row * width + col) as LocationId;
    for row in 0..height {
        for col in 0..width {
            network.add_location(
                id(col, row),
                Position::new(col as f64 * spacing, row as f64 * spacing),
            );
        }
    }
    for row in 0..height {
        for col in 0..width {
            if col + 1 < width {
                link(&mut network, id(col, row), id(col + 1, row), spacing);
            }
            if row + 1 < height {
                link(&mut network, id(col, row), id(col, row + 1), spacing);
            }
        }
    }
    validate_all(&mut network);
    network
}

/// 5x4 grid (ids 0..20, 100 m spacing) plus [`ISOLATED_LOCATION`], which has
/// no connections but was left in the validated pool.
pub fn isolated_pickup_network() -> RoadNetwork {
    let mut network = grid_network(5, 4, 100.0);
    network.add_location(ISOLATED_LOCATION, Position::new(1000.0, 1000.0));
    validate_all(&mut network);
    network
}
