use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::AssignmentGroup;
use matchmaker::allocator::{Allocator, GroupOutcome};
use matchmaker::backfill::BackfillMatching;
use matchmaker::config::Config;
use matchmaker::discovery::HttpDiscovery;
use matchmaker::match_function::{MatchFunction, MatchFunctionRequest};
use matchmaker::player_capacity::PlayerCapacity;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "matchmaker",
    about = "Build matches from ticket pools and assign them to game servers"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a match function over a request read from a JSON file
    MakeMatches {
        #[arg(long, value_enum, default_value_t = Strategy::Capacity)]
        strategy: Strategy,

        /// Path to a JSON match function request
        #[arg(long)]
        input: PathBuf,

        /// Tickets per match for the capacity strategy
        #[arg(long)]
        capacity: Option<usize>,

        /// Target players per match for the backfill strategy
        #[arg(long)]
        players_per_match: Option<i32>,
    },
    /// Assign connections to the assignment groups in a JSON file
    Assign {
        /// Path to a JSON array of assignment groups
        #[arg(long)]
        input: PathBuf,

        /// Discovery service base URL (overrides MATCHMAKER_DISCOVERY_URL)
        #[arg(long)]
        discovery_url: Option<String>,

        /// Discovery request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Capacity,
    Backfill,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    match args.command {
        Command::MakeMatches {
            strategy,
            input,
            capacity,
            players_per_match,
        } => {
            if let Some(capacity) = capacity {
                config.match_capacity = capacity;
            }
            if let Some(players) = players_per_match {
                config.players_per_match = players;
            }
            make_matches(&config, strategy, &input)
        }
        Command::Assign {
            input,
            discovery_url,
            timeout_ms,
        } => {
            if let Some(url) = discovery_url {
                config.discovery_url = url;
            }
            if let Some(ms) = timeout_ms {
                config.discovery_timeout = Duration::from_millis(ms);
            }
            assign(&config, &input).await
        }
    }
}

fn make_matches(config: &Config, strategy: Strategy, input: &Path) -> Result<()> {
    let request: MatchFunctionRequest = read_json(input)?;

    let function: Box<dyn MatchFunction> = match strategy {
        Strategy::Capacity => Box::new(PlayerCapacity::new(config.match_capacity)),
        Strategy::Backfill => Box::new(BackfillMatching::new(config.players_per_match)),
    };

    let matches = function
        .make_matches(&request)
        .with_context(|| format!("Match function {} failed", function.name()))?;
    info!(function = function.name(), matches = matches.len(), "Matches created");

    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

async fn assign(config: &Config, input: &Path) -> Result<()> {
    let mut groups: Vec<AssignmentGroup> = read_json(input)?;

    let discovery = Arc::new(HttpDiscovery::new(config.discovery_url.clone()));
    let allocator = Allocator::new(discovery, config.discovery_timeout);

    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling discovery requests");
            ctrl_c_token.cancel();
        }
    });

    let report = allocator.allocate(&cancellation_token, &mut groups).await;
    info!(
        assigned = report.assigned(),
        unassigned = report.unassigned(),
        "Assignment finished"
    );

    let outcomes: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            GroupOutcome::Assigned { connection, ticket_ids } => serde_json::json!({
                "status": "assigned",
                "connection": connection,
                "ticket_ids": ticket_ids,
            }),
            GroupOutcome::Unassigned { ticket_ids, error } => serde_json::json!({
                "status": "unassigned",
                "reason": error.reason(),
                "message": error.to_string(),
                "ticket_ids": ticket_ids,
            }),
        })
        .collect();

    let output = serde_json::json!({
        "groups": groups,
        "outcomes": outcomes,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
