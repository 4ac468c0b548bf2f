//! Error taxonomy shared by the network, routing and dispatch layers.

use std::fmt;

use crate::network::LocationId;
use crate::vehicle::VehicleId;

/// Errors raised by the simulation core.
///
/// Routing-time variants (`NoPathFound`, `DisconnectedLocation`,
/// `StuckVehicle`) are handled inside dispatch and only surface in logs.
/// `InvariantViolation` and the construction variants stop the run.
#[derive(Debug)]
pub enum SimError {
    /// A query referenced a location id that is not in the network.
    InvalidLocation(LocationId),
    /// No sequence of connections links `from` to `to`.
    NoPathFound { from: LocationId, to: LocationId },
    /// A location failed connectivity validation and left the dispatch pool.
    DisconnectedLocation(LocationId),
    /// A vehicle's own location failed connectivity validation.
    StuckVehicle {
        vehicle: VehicleId,
        location: LocationId,
    },
    /// Internal contradiction in simulation state.
    InvariantViolation(String),
    /// A location path contains two consecutive ids with no connection between them.
    MissingConnection { from: LocationId, to: LocationId },
    /// Malformed network record.
    InvalidRecord(String),
    /// Simulation parameters that cannot be run.
    InvalidConfig(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidLocation(id) => write!(f, "location {id} is not in the network"),
            SimError::NoPathFound { from, to } => {
                write!(f, "no path from location {from} to location {to}")
            }
            SimError::DisconnectedLocation(id) => {
                write!(f, "location {id} is not part of the connected network")
            }
            SimError::StuckVehicle { vehicle, location } => {
                write!(f, "vehicle {vehicle} is stuck at disconnected location {location}")
            }
            SimError::InvariantViolation(msg) => write!(f, "invariant violated: {msg}"),
            SimError::MissingConnection { from, to } => {
                write!(f, "no connection from location {from} to location {to}")
            }
            SimError::InvalidRecord(msg) => write!(f, "invalid network record: {msg}"),
            SimError::InvalidConfig(msg) => write!(f, "invalid simulation parameters: {msg}"),
            SimError::Io(err) => write!(f, "i/o error: {err}"),
            SimError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            SimError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Json(err)
    }
}

pub type SimResult<T> = Result<T, SimError>;
