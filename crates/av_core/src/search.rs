//! A* shortest-path search over a [`RoadNetwork`].
//!
//! The heuristic is the straight-line distance between positions, memoized per
//! `(from, to)` pair for the lifetime of the engine; positions never change so
//! the cache is never invalidated. The same heuristic is used for both metrics,
//! which keeps it admissible for [`Metric::Distance`] only: time-metric routes
//! are close to, not guaranteed, optimal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::{LocationId, RoadNetwork};

/// Cost function used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Metres.
    Distance,
    /// Free-flow seconds.
    Time,
}

impl Metric {
    /// Cost of the direct connection `from -> to` under this metric.
    pub fn edge_cost(self, network: &RoadNetwork, from: LocationId, to: LocationId) -> f64 {
        match self {
            Metric::Distance => network.distance_metric(from, to),
            Metric::Time => network.time_metric(from, to),
        }
    }

    /// Total cost of a location path under this metric.
    pub fn path_cost(self, network: &RoadNetwork, path: &[LocationId]) -> f64 {
        path.windows(2)
            .map(|pair| self.edge_cost(network, pair[0], pair[1]))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    f_score: f64,
    g_score: f64,
    location: LocationId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the lowest f first.
        other.f_score.total_cmp(&self.f_score)
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct PathSearch {
    estimate_cache: HashMap<(LocationId, LocationId), f64>,
}

impl PathSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized heuristic estimates.
    pub fn cached_estimates(&self) -> usize {
        self.estimate_cache.len()
    }

    /// Lowest-cost location sequence from `start` to `goal` (inclusive), or an
    /// empty vector when the goal is unreachable.
    pub fn find_shortest_path(
        &mut self,
        network: &RoadNetwork,
        start: LocationId,
        goal: LocationId,
        metric: Metric,
    ) -> SimResult<Vec<LocationId>> {
        for id in [start, goal] {
            if !network.contains(id) {
                return Err(SimError::InvalidLocation(id));
            }
        }

        let mut came_from: HashMap<LocationId, LocationId> = HashMap::new();
        let mut g_scores: HashMap<LocationId, f64> = HashMap::from([(start, 0.0)]);
        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            f_score: self.estimate(network, start, goal)?,
            g_score: 0.0,
            location: start,
        });

        while let Some(FrontierEntry {
            g_score, location, ..
        }) = frontier.pop()
        {
            if location == goal {
                return Ok(reconstruct_path(&came_from, goal));
            }
            // Skip entries superseded by a cheaper route found after they were pushed.
            if g_scores.get(&location).is_some_and(|best| g_score > *best) {
                continue;
            }

            for &neighbor in network.next_locations(location) {
                let tentative = g_score + metric.edge_cost(network, location, neighbor);
                let improves = match g_scores.get(&neighbor) {
                    None => true,
                    Some(best) => tentative < *best,
                };
                if improves {
                    came_from.insert(neighbor, location);
                    g_scores.insert(neighbor, tentative);
                    frontier.push(FrontierEntry {
                        f_score: tentative + self.estimate(network, neighbor, goal)?,
                        g_score: tentative,
                        location: neighbor,
                    });
                }
            }
        }

        Ok(Vec::new())
    }

    fn estimate(&mut self, network: &RoadNetwork, from: LocationId, to: LocationId) -> SimResult<f64> {
        if let Some(estimate) = self.estimate_cache.get(&(from, to)) {
            return Ok(*estimate);
        }
        let estimate = network.position(from)?.euclidean(&network.position(to)?);
        self.estimate_cache.insert((from, to), estimate);
        Ok(estimate)
    }
}

fn reconstruct_path(came_from: &HashMap<LocationId, LocationId>, goal: LocationId) -> Vec<LocationId> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{cycle_network, grid_network};

    #[test]
    fn cycle_route_by_distance_costs_two_hops() {
        let network = cycle_network();
        let mut search = PathSearch::new();
        let path = search
            .find_shortest_path(&network, 1, 3, Metric::Distance)
            .expect("search");
        assert!(path == vec![1, 2, 3] || path == vec![1, 4, 3], "got {path:?}");
        assert_eq!(Metric::Distance.path_cost(&network, &path), 200.0);
        assert!((Metric::Time.path_cost(&network, &path) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn start_equals_goal_is_a_single_location() {
        let network = cycle_network();
        let mut search = PathSearch::new();
        let path = search
            .find_shortest_path(&network, 2, 2, Metric::Time)
            .expect("search");
        assert_eq!(path, vec![2]);
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let network = cycle_network();
        let mut search = PathSearch::new();
        assert!(matches!(
            search.find_shortest_path(&network, 1, 99, Metric::Distance),
            Err(SimError::InvalidLocation(99))
        ));
        assert!(matches!(
            search.find_shortest_path(&network, 99, 1, Metric::Distance),
            Err(SimError::InvalidLocation(99))
        ));
    }

    #[test]
    fn one_way_streets_are_respected() {
        let mut network = cycle_network();
        // Only a one-way spur 3 -> 5 leads to 5; nothing leads back.
        network.add_location(5, crate::network::Position::new(100.0, 150.0));
        network
            .add_one_way(crate::network::Connection::new(3, 5, 50.0, 36.0))
            .expect("spur");
        let mut search = PathSearch::new();
        let there = search
            .find_shortest_path(&network, 1, 5, Metric::Distance)
            .expect("search");
        assert_eq!(there.first(), Some(&1));
        assert_eq!(there.last(), Some(&5));
        let back = search
            .find_shortest_path(&network, 5, 1, Metric::Distance)
            .expect("search");
        assert!(back.is_empty());
    }

    #[test]
    fn time_metric_routes_take_monotone_grid_paths() {
        let network = grid_network(3, 3, 100.0);
        let mut search = PathSearch::new();
        let path = search
            .find_shortest_path(&network, 0, 8, Metric::Time)
            .expect("search");
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&8));
        assert_eq!(path.len(), 5, "four hops on a 3x3 grid");
    }

    #[test]
    fn heuristic_estimates_are_memoized() {
        let network = grid_network(4, 4, 100.0);
        let mut search = PathSearch::new();
        search
            .find_shortest_path(&network, 0, 15, Metric::Distance)
            .expect("search");
        let cached = search.cached_estimates();
        assert!(cached > 0);
        search
            .find_shortest_path(&network, 0, 15, Metric::Distance)
            .expect("search");
        assert_eq!(search.cached_estimates(), cached);
    }
}
