pub mod clock;
pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod network;
pub mod network_import;
pub mod requests;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod search;
pub mod systems;
pub mod telemetry;
pub mod valid_store;
pub mod vehicle;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{SimError, SimResult};
