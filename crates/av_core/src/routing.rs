//! Routing facade used by validation and dispatch.
//!
//! [`RouteFinder`] owns the A* engine and an LRU cache of successful routes keyed
//! by `(start, goal, metric)`. Failures are not cached: the network does not
//! change after construction, so they would only repeat, but they are cheap to
//! detect and keeping them out leaves the cache for useful routes.

use std::num::NonZeroUsize;

use bevy_ecs::prelude::Resource;
use log::debug;
use lru::LruCache;

use crate::error::SimResult;
use crate::network::{LocationId, RoadNetwork};
use crate::search::{Metric, PathSearch};

/// Default number of cached routes.
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 20_000;

#[derive(Resource)]
pub struct RouteFinder {
    search: PathSearch,
    cache: LruCache<(LocationId, LocationId, Metric), Vec<LocationId>>,
    cache_hits: u64,
    searches: u64,
}

impl Default for RouteFinder {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ROUTE_CACHE_CAPACITY)
    }
}

impl RouteFinder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            search: PathSearch::new(),
            cache: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN)),
            cache_hits: 0,
            searches: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Route from `start` to `goal`; empty when no path exists.
    pub fn find_route(
        &mut self,
        network: &RoadNetwork,
        start: LocationId,
        goal: LocationId,
        metric: Metric,
    ) -> SimResult<Vec<LocationId>> {
        let key = (start, goal, metric);
        if let Some(cached) = self.cache.get(&key) {
            self.cache_hits += 1;
            return Ok(cached.clone());
        }

        self.searches += 1;
        let path = self.search.find_shortest_path(network, start, goal, metric)?;
        if path.is_empty() {
            let from = network.position(start)?;
            let to = network.position(goal)?;
            debug!(
                "unable to find route from {start} ({:.5},{:.5}) to {goal} ({:.5},{:.5})",
                from.y, from.x, to.y, to.x
            );
        } else {
            self.cache.put(key, path.clone());
        }
        Ok(path)
    }

    /// Cost of the best route under `metric`, `+∞` when unreachable.
    pub fn route_cost(
        &mut self,
        network: &RoadNetwork,
        start: LocationId,
        goal: LocationId,
        metric: Metric,
    ) -> SimResult<f64> {
        let path = self.find_route(network, start, goal, metric)?;
        if path.is_empty() {
            return Ok(f64::INFINITY);
        }
        Ok(metric.path_cost(network, &path))
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Number of A* searches actually run (cache misses).
    pub fn searches(&self) -> u64 {
        self.searches
    }
}
