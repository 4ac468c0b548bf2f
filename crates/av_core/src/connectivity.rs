//! Empirical connectivity validation.
//!
//! Real road data contains islands: parking lots, private driveways and
//! fragments clipped at the map boundary. A location belongs to the usable
//! network when most routing probes from it to randomly drawn locations succeed.
//! The classification is statistical; a location in a small component can pass
//! if its probes happen to land inside that component.

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SimResult;
use crate::network::{LocationId, RoadNetwork};
use crate::routing::RouteFinder;
use crate::search::Metric;
use crate::valid_store::ValidLocationStore;

pub const DEFAULT_PROBES: usize = 10;
pub const DEFAULT_VALIDATION_SEED: u64 = 0x5eed_cafe;

#[derive(Debug, Clone, Resource)]
pub struct ConnectivityValidator {
    probes: usize,
    seed: u64,
}

impl Default for ConnectivityValidator {
    fn default() -> Self {
        Self::new(DEFAULT_PROBES, DEFAULT_VALIDATION_SEED)
    }
}

impl ConnectivityValidator {
    pub fn new(probes: usize, seed: u64) -> Self {
        Self {
            probes: probes.max(1),
            seed,
        }
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    /// Probes routes from `location` to random locations; valid when fewer than
    /// half of them fail. Probe targets may include `location` itself.
    pub fn is_connected<R: Rng>(
        &self,
        location: LocationId,
        network: &RoadNetwork,
        router: &mut RouteFinder,
        rng: &mut R,
    ) -> SimResult<bool> {
        let mut failures = 0;
        for _ in 0..self.probes {
            let Some(target) = network.random_location(rng) else {
                return Ok(false);
            };
            if router
                .find_route(network, location, target, Metric::Distance)?
                .is_empty()
            {
                failures += 1;
            }
        }
        Ok(failures * 2 < self.probes)
    }

    /// Classifies every location in id order. The probe RNG is seeded from the
    /// validator's own seed, so an unchanged network yields the same set.
    pub fn validate_network(
        &self,
        network: &RoadNetwork,
        router: &mut RouteFinder,
    ) -> SimResult<Vec<LocationId>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut valid = Vec::with_capacity(network.location_count());
        for &id in network.location_ids() {
            if self.is_connected(id, network, router, &mut rng)? {
                valid.push(id);
            }
        }
        Ok(valid)
    }

    /// Fills the network's validated pool, reusing a stored result for the
    /// network's source when one exists. Returns the pool size.
    pub fn prepare_network(
        &self,
        network: &mut RoadNetwork,
        router: &mut RouteFinder,
        store: &mut dyn ValidLocationStore,
    ) -> SimResult<usize> {
        let key = network.source().to_owned();
        if let Some(ids) = store.load(&key)? {
            network.set_valid_locations(ids);
            info!(
                "loaded {} validated locations for '{key}'",
                network.valid_locations().len()
            );
            return Ok(network.valid_locations().len());
        }

        info!(
            "validating {} locations of '{key}' ({} probes each)",
            network.location_count(),
            self.probes
        );
        let valid = self.validate_network(network, router)?;
        let rejected = network.location_count() - valid.len();
        if rejected > 0 {
            warn!("{rejected} locations failed connectivity validation");
        }
        store.save(&key, &valid)?;
        network.set_valid_locations(valid);
        Ok(network.valid_locations().len())
    }
}
