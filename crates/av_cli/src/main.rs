use std::path::PathBuf;

use anyhow::Context;
use av_core::clock::DEFAULT_TICK_SECS;
use av_core::network_import::load_network_file;
use av_core::requests::DEFAULT_REQUESTS_PER_HOUR;
use av_core::runner::simulate_hours;
use av_core::scenario::{build_simulation, prepare_network, AgentKind, SimulationParams};
use av_core::valid_store::JsonFileStore;
use bevy_ecs::prelude::World;
use clap::{Parser, ValueEnum};
use log::info;

#[derive(Parser)]
#[command(
    name = "avsim",
    about = "Simulate an autonomous vehicle fleet serving ride requests on a road network"
)]
struct Cli {
    /// Controller driving the fleet
    #[arg(long, value_enum, default_value_t = Agent::Dispatch)]
    agent: Agent,
    /// Simulated hours to run
    #[arg(long, default_value_t = 24.0, value_parser = positive_f64)]
    hours: f64,
    /// Road network JSON document
    #[arg(long, env = "AVSIM_NETWORK")]
    network: PathBuf,
    /// Vehicles placed before the first tick; more are added on demand
    #[arg(long, default_value_t = 0)]
    fleet: usize,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = DEFAULT_TICK_SECS, value_parser = positive_f64)]
    tick_secs: f64,
    /// Mean ride requests per simulated hour
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_HOUR, value_parser = non_negative_f64)]
    requests_per_hour: f64,
    /// Directory holding validated-location lists
    #[arg(long, env = "AVSIM_CACHE_DIR", default_value = ".avsim-cache")]
    cache_dir: PathBuf,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Agent {
    /// Generate requests but never dispatch
    None,
    /// Dispatch the fleet to every request
    Dispatch,
}

impl From<Agent> for AgentKind {
    fn from(agent: Agent) -> Self {
        match agent {
            Agent::None => AgentKind::NoDispatch,
            Agent::Dispatch => AgentKind::FleetDispatch,
        }
    }
}

fn parse_finite(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() {
        return Err(format!("'{value}' is not a finite number"));
    }
    Ok(parsed)
}

fn positive_f64(value: &str) -> Result<f64, String> {
    let parsed = parse_finite(value)?;
    if parsed <= 0.0 {
        return Err(format!("must be greater than zero, got {parsed}"));
    }
    Ok(parsed)
}

fn non_negative_f64(value: &str) -> Result<f64, String> {
    let parsed = parse_finite(value)?;
    if parsed < 0.0 {
        return Err(format!("must not be negative, got {parsed}"));
    }
    Ok(parsed)
}

impl Cli {
    fn params(&self) -> SimulationParams {
        let mut params = SimulationParams::default()
            .with_agent(self.agent.into())
            .with_tick_secs(self.tick_secs)
            .with_requests_per_hour(self.requests_per_hour)
            .with_initial_fleet(self.fleet);
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        params
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let params = cli.params();

    let mut network = load_network_file(&cli.network)
        .with_context(|| format!("failed to load network {}", cli.network.display()))?;
    let mut store = JsonFileStore::new(&cli.cache_dir);
    let pool = prepare_network(&mut network, &params, &mut store)
        .context("failed to validate network connectivity")?;
    info!("{pool} locations available for dispatch");

    let mut world = World::new();
    build_simulation(&mut world, network, params).context("failed to build simulation")?;
    let summary = simulate_hours(&mut world, cli.hours).context("simulation halted")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.report());
    }
    Ok(())
}
