//! Road network graph: an arena of locations keyed by id, directed connections
//! keyed by `(source, target)`, and a derived adjacency index.
//!
//! Construction order is: add locations, add connections, [`RoadNetwork::prune_isolated`],
//! [`RoadNetwork::rebuild_adjacency`]. [`RoadNetwork::from_records`] runs the whole
//! sequence. After construction the network is read-mostly; only the validated
//! location pool shrinks when dispatch evicts an unroutable location.
//!
//! Ids are kept in sorted maps so neighbour order and random draws are
//! reproducible under a fixed seed.

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::Resource;
use log::warn;
use rand::Rng;

use crate::error::{SimError, SimResult};
use crate::network_import::{ConnectionRecord, LocationRecord};

/// Stable location identifier (OSM node ids are 64-bit).
pub type LocationId = i64;

/// Free-flow speed assumed when a connection carries none (km/h).
pub const DEFAULT_SPEED_KPH: f64 = 50.0;

const KPH_TO_MPS: f64 = 1000.0 / 3600.0;

/// Convert km/h to m/s.
pub fn kph_to_mps(speed_kph: f64) -> f64 {
    speed_kph * KPH_TO_MPS
}

/// Planar position of a location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance in the plane.
    pub fn euclidean(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub id: LocationId,
    pub position: Position,
}

/// Descriptive road attributes, carried through but never interpreted by routing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadAttributes {
    pub name: String,
    pub road_class: String,
    pub reference: String,
}

impl RoadAttributes {
    /// Human-readable label for logs: the road name, else its reference.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.reference
        } else {
            &self.name
        }
    }
}

/// Directed, weighted link between two locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub source: LocationId,
    pub target: LocationId,
    /// Metres; `f64::INFINITY` when the source data had no length.
    pub length_m: f64,
    pub max_speed_kph: f64,
    pub one_way: bool,
    pub attributes: RoadAttributes,
}

impl Connection {
    pub fn new(source: LocationId, target: LocationId, length_m: f64, max_speed_kph: f64) -> Self {
        Self {
            source,
            target,
            length_m,
            max_speed_kph,
            one_way: true,
            attributes: RoadAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: RoadAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Free-flow traversal time in seconds.
    pub fn travel_time_secs(&self) -> f64 {
        self.length_m / kph_to_mps(self.max_speed_kph)
    }

    fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            ..self.clone()
        }
    }
}

/// Outbound and inbound neighbour ids of one location.
#[derive(Debug, Clone, Default)]
struct Adjacency {
    outbound: Vec<LocationId>,
    inbound: Vec<LocationId>,
}

#[derive(Debug, Clone, Default, Resource)]
pub struct RoadNetwork {
    /// Identity of the data source (file stem); keys the validated-location store.
    source: String,
    locations: BTreeMap<LocationId, Location>,
    connections: BTreeMap<(LocationId, LocationId), Connection>,
    adjacency: BTreeMap<LocationId, Adjacency>,
    location_ids: Vec<LocationId>,
    valid_locations: Vec<LocationId>,
}

impl RoadNetwork {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Build a network from imported records: add, link, prune, index.
    pub fn from_records(
        source: impl Into<String>,
        locations: &[LocationRecord],
        connections: &[ConnectionRecord],
    ) -> SimResult<Self> {
        let mut network = Self::new(source);
        for record in locations {
            network.add_location(record.id, Position::new(record.x, record.y));
        }
        for record in connections {
            let connection = record.to_connection();
            if record.oneway {
                network.add_one_way(connection)?;
            } else {
                network.add_two_way(connection)?;
            }
        }
        network.prune_isolated();
        network.rebuild_adjacency();
        Ok(network)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Adds a location; a duplicate id is reported and the first one kept.
    pub fn add_location(&mut self, id: LocationId, position: Position) {
        if self.locations.contains_key(&id) {
            warn!("ignoring duplicate location {id}");
            return;
        }
        self.locations.insert(id, Location { id, position });
        let slot = self
            .location_ids
            .binary_search(&id)
            .unwrap_or_else(|slot| slot);
        self.location_ids.insert(slot, id);
    }

    pub fn add_one_way(&mut self, mut connection: Connection) -> SimResult<()> {
        self.check_connection(&connection)?;
        connection.one_way = true;
        self.insert_connection(connection);
        Ok(())
    }

    /// Adds the connection and its mirror with identical attributes.
    pub fn add_two_way(&mut self, mut connection: Connection) -> SimResult<()> {
        self.check_connection(&connection)?;
        connection.one_way = false;
        let reverse = connection.reversed();
        self.insert_connection(connection);
        self.insert_connection(reverse);
        Ok(())
    }

    /// Both endpoints must exist and the speed must be positive.
    fn check_connection(&self, connection: &Connection) -> SimResult<()> {
        for id in [connection.source, connection.target] {
            if !self.locations.contains_key(&id) {
                return Err(SimError::InvalidLocation(id));
            }
        }
        if !(connection.max_speed_kph.is_finite() && connection.max_speed_kph > 0.0) {
            return Err(SimError::InvalidRecord(format!(
                "connection {} -> {} has speed {} km/h",
                connection.source, connection.target, connection.max_speed_kph
            )));
        }
        Ok(())
    }

    fn insert_connection(&mut self, connection: Connection) {
        let (source, target) = (connection.source, connection.target);
        if self.connections.insert((source, target), connection).is_none() {
            self.adjacency.entry(source).or_default().outbound.push(target);
            self.adjacency.entry(target).or_default().inbound.push(source);
        }
    }

    /// Removes every location that no connection touches.
    pub fn prune_isolated(&mut self) -> usize {
        let before = self.locations.len();
        let touched: BTreeSet<LocationId> = self
            .connections
            .keys()
            .flat_map(|&(source, target)| [source, target])
            .collect();
        self.locations.retain(|id, _| touched.contains(id));
        self.location_ids = self.locations.keys().copied().collect();
        self.valid_locations
            .retain(|id| self.locations.contains_key(id));
        before - self.locations.len()
    }

    /// Recomputes the adjacency index from the connection set, in id order.
    pub fn rebuild_adjacency(&mut self) {
        self.adjacency.clear();
        for &(source, target) in self.connections.keys() {
            self.adjacency.entry(source).or_default().outbound.push(target);
            self.adjacency.entry(target).or_default().inbound.push(source);
        }
    }

    pub fn contains(&self, id: LocationId) -> bool {
        self.locations.contains_key(&id)
    }

    /// All location ids in ascending order.
    pub fn location_ids(&self) -> &[LocationId] {
        &self.location_ids
    }

    pub fn connection(&self, from: LocationId, to: LocationId) -> Option<&Connection> {
        self.connections.get(&(from, to))
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Locations reachable by following one connection out of `id`.
    pub fn next_locations(&self, id: LocationId) -> &[LocationId] {
        self.adjacency
            .get(&id)
            .map(|adj| adj.outbound.as_slice())
            .unwrap_or(&[])
    }

    /// Locations that reach `id` by one connection.
    pub fn prev_locations(&self, id: LocationId) -> &[LocationId] {
        self.adjacency
            .get(&id)
            .map(|adj| adj.inbound.as_slice())
            .unwrap_or(&[])
    }

    /// Length of the direct connection, `+∞` if the locations are not adjacent.
    pub fn distance_metric(&self, from: LocationId, to: LocationId) -> f64 {
        self.connection(from, to)
            .map(|c| c.length_m)
            .unwrap_or(f64::INFINITY)
    }

    /// Free-flow time over the direct connection, `+∞` if not adjacent.
    pub fn time_metric(&self, from: LocationId, to: LocationId) -> f64 {
        self.connection(from, to)
            .map(Connection::travel_time_secs)
            .unwrap_or(f64::INFINITY)
    }

    pub fn position(&self, id: LocationId) -> SimResult<Position> {
        self.locations
            .get(&id)
            .map(|loc| loc.position)
            .ok_or(SimError::InvalidLocation(id))
    }

    /// Uniformly random location; it may sit in a disconnected fragment.
    pub fn random_location<R: Rng>(&self, rng: &mut R) -> Option<LocationId> {
        if self.location_ids.is_empty() {
            return None;
        }
        Some(self.location_ids[rng.gen_range(0..self.location_ids.len())])
    }

    /// Uniformly random location from the validated pool.
    pub fn random_valid_location<R: Rng>(&self, rng: &mut R) -> Option<LocationId> {
        if self.valid_locations.is_empty() {
            return None;
        }
        Some(self.valid_locations[rng.gen_range(0..self.valid_locations.len())])
    }

    pub fn valid_locations(&self) -> &[LocationId] {
        &self.valid_locations
    }

    /// Replaces the validated pool; ids unknown to the network are dropped.
    pub fn set_valid_locations(&mut self, ids: Vec<LocationId>) {
        let dropped = ids.iter().filter(|id| !self.contains(**id)).count();
        if dropped > 0 {
            warn!("dropping {dropped} validated ids that are not in network '{}'", self.source);
        }
        self.valid_locations = ids.into_iter().filter(|id| self.contains(*id)).collect();
    }

    pub fn is_valid_location(&self, id: LocationId) -> bool {
        self.valid_locations.contains(&id)
    }

    /// Evicts a location from the dispatch-eligible pool. Returns whether it was present.
    pub fn remove_valid_location(&mut self, id: LocationId) -> bool {
        let before = self.valid_locations.len();
        self.valid_locations.retain(|valid| *valid != id);
        before != self.valid_locations.len()
    }

    /// Resolves a location-id path into the connections it traverses.
    pub fn travel_path(&self, ids: &[LocationId]) -> SimResult<Vec<Connection>> {
        ids.windows(2)
            .map(|pair| {
                self.connection(pair[0], pair[1])
                    .cloned()
                    .ok_or(SimError::MissingConnection {
                        from: pair[0],
                        to: pair[1],
                    })
            })
            .collect()
    }

    /// Summed length of a location-id path; `+∞` if a hop is missing.
    pub fn path_length(&self, ids: &[LocationId]) -> f64 {
        ids.windows(2)
            .map(|pair| self.distance_metric(pair[0], pair[1]))
            .sum()
    }
}
