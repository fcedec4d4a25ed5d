use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tripweave_agents::{OrchestratorConfig, TemplatePlanner, TripOrchestrator};
use tripweave_core::{RawPayload, RouteMode, TripRequest};
use tripweave_maps::{MapsService, ReplayChannel};
use tripweave_observability::{init_tracing, AppMetrics};
use tripweave_payload::decode;

#[derive(Debug, Parser)]
#[command(name = "tripweave")]
#[command(about = "Map-backed trip itinerary tooling")]
struct Cli {
    /// Replay fixture answering map operations.
    #[arg(long, global = true, env = "TRIPWEAVE_FIXTURES")]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize a raw provider payload and print it as JSON.
    Decode { file: PathBuf },
    Search {
        #[arg(long)]
        city: String,
        #[arg(long)]
        keywords: String,
        /// Only the first candidate with a coordinate.
        #[arg(long)]
        first: bool,
    },
    Route {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "walking")]
        mode: String,
        #[arg(long)]
        city: Option<String>,
    },
    Weather {
        #[arg(long)]
        city: String,
    },
    Geocode {
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// Build an itinerary for a JSON trip request.
    Plan {
        #[arg(long)]
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("tripweave");
    let cli = Cli::parse();
    let config = OrchestratorConfig::from_env();

    match cli.command {
        Command::Decode { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed reading payload: {}", file.display()))?;
            let decoded = decode(&RawPayload::Text(raw))?;
            print_json(&decoded)?;
        }
        Command::Search {
            city,
            keywords,
            first,
        } => {
            let maps = maps_service(cli.fixtures.as_deref(), &config)?;
            if first {
                let candidates = config.limits.first_poi_candidates;
                let poi = maps.pois.find_first_poi(&keywords, &city, true, candidates);
                print_json(&poi)?;
            } else {
                let pois = maps.pois.search_pois(&keywords, &city, true);
                print_json(&pois)?;
            }
        }
        Command::Route {
            from,
            to,
            mode,
            city,
        } => {
            let mode: RouteMode = mode.parse().context("invalid --mode value")?;
            let maps = maps_service(cli.fixtures.as_deref(), &config)?;
            let summary =
                maps.routes
                    .plan_route(&from, &to, city.as_deref(), city.as_deref(), mode);
            print_json(&summary)?;
        }
        Command::Weather { city } => {
            let maps = maps_service(cli.fixtures.as_deref(), &config)?;
            print_json(&maps.places.weather(&city))?;
        }
        Command::Geocode { address, city } => {
            let maps = maps_service(cli.fixtures.as_deref(), &config)?;
            print_json(&maps.places.geocode(&address, city.as_deref()))?;
        }
        Command::Plan { request } => {
            let raw = fs::read_to_string(&request)
                .with_context(|| format!("failed reading trip request: {}", request.display()))?;
            let trip: TripRequest =
                serde_json::from_str(&raw).context("invalid trip request document")?;

            let metrics = AppMetrics::shared();
            let orchestrator = TripOrchestrator::new(
                Arc::new(replay_channel(cli.fixtures.as_deref())?),
                Arc::new(TemplatePlanner),
                config,
                metrics.clone(),
            );
            let planned = orchestrator.plan(trip).await?;
            print_json(&json!({
                "plan": planned,
                "metrics": metrics.snapshot(),
            }))?;
        }
    }

    Ok(())
}

fn replay_channel(fixtures: Option<&Path>) -> Result<ReplayChannel> {
    match fixtures {
        Some(path) => ReplayChannel::from_json_file(path),
        None => Ok(ReplayChannel::new()),
    }
}

fn maps_service(fixtures: Option<&Path>, config: &OrchestratorConfig) -> Result<MapsService> {
    let channel = replay_channel(fixtures)?;
    Ok(MapsService::new(Arc::new(channel), config.limits))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
