mod config;
mod departure;
mod planner;

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{info, instrument, warn};
use tripweave_core::{build_fallback_itinerary, build_template_itinerary, Itinerary, TripRequest};
use tripweave_maps::{MapsService, ToolChannel};
use tripweave_observability::AppMetrics;
use uuid::Uuid;

pub use config::{OrchestratorConfig, AIRPORT_KEYWORD, DEFAULT_KEYWORD, DEFAULT_PLANNER_TIMEOUT};
pub use departure::departure_note;
pub use planner::{TemplatePlanner, TripPlanner};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("trip planner failed: {0:#}")]
    Planner(anyhow::Error),
    #[error("trip planner panicked: {0}")]
    PlannerPanicked(String),
    #[error("planning worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Model,
    PoiFallback,
    Template,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedTrip {
    pub itinerary: Itinerary,
    pub source: PlanSource,
}

/// Chooses between the model planner and the map-data fallback for each
/// trip request.
#[derive(Clone)]
pub struct TripOrchestrator {
    maps: MapsService,
    planner: Arc<dyn TripPlanner>,
    config: OrchestratorConfig,
    metrics: Arc<AppMetrics>,
}

impl TripOrchestrator {
    pub fn new(
        channel: Arc<dyn ToolChannel>,
        planner: Arc<dyn TripPlanner>,
        config: OrchestratorConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            maps: MapsService::new(channel, config.limits),
            planner,
            config,
            metrics,
        }
    }

    pub fn maps(&self) -> &MapsService {
        &self.maps
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[instrument(
        skip_all,
        fields(request_id = %Uuid::new_v4(), city = %request.city, days = request.travel_days)
    )]
    pub async fn plan(&self, request: TripRequest) -> Result<PlannedTrip, OrchestratorError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let departure = request.gps_fix().map(|_| {
            let maps = self.maps.clone();
            let request = request.clone();
            let keyword = self.config.airport_keyword.clone();
            spawn_blocking(move || departure_note(&maps, &request, &keyword))
        });

        let mut planned = if self.config.has_planner_credential() {
            match self.run_planner(&request).await? {
                Some(itinerary) => PlannedTrip {
                    itinerary,
                    source: PlanSource::Model,
                },
                None => self.run_fallback(&request).await?,
            }
        } else {
            info!("no planner credential configured, using map data");
            self.run_fallback(&request).await?
        };

        if let Some(handle) = departure {
            match handle.await {
                Ok(Some(note)) => planned.itinerary.prepend_suggestion(&note),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "departure note worker failed"),
            }
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            source = ?planned.source,
            days = planned.itinerary.days.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "trip planned"
        );
        Ok(planned)
    }

    /// Runs the model planner under the configured timeout. `Ok(None)` means
    /// it timed out; the worker keeps running detached.
    async fn run_planner(
        &self,
        request: &TripRequest,
    ) -> Result<Option<Itinerary>, OrchestratorError> {
        self.metrics.inc_model_attempt();
        let planner = Arc::clone(&self.planner);
        let owned = request.clone();
        let worker = spawn_blocking(move || planner.plan_trip(&owned));

        match tokio::time::timeout(self.config.planner_timeout, worker).await {
            Ok(Ok(Ok(itinerary))) => Ok(Some(itinerary)),
            Ok(Ok(Err(err))) => {
                warn!(error = %err, "trip planner failed");
                Err(OrchestratorError::Planner(err))
            }
            Ok(Err(join_err)) => Err(planner_join_error(join_err)),
            Err(_) => {
                self.metrics.inc_planner_timeout();
                warn!(
                    timeout_secs = self.config.planner_timeout.as_secs_f64(),
                    "trip planner timed out, falling back to map data"
                );
                Ok(None)
            }
        }
    }

    async fn run_fallback(&self, request: &TripRequest) -> Result<PlannedTrip, OrchestratorError> {
        let maps = self.maps.clone();
        let owned = request.clone();
        let keyword = request
            .primary_preference()
            .unwrap_or(self.config.default_keyword.as_str())
            .to_string();

        let planned = spawn_blocking(move || fallback_plan(&maps, &owned, &keyword))
            .await
            .map_err(|err| OrchestratorError::Worker(err.to_string()))?;

        match planned.source {
            PlanSource::Template => self.metrics.inc_template_fallback(),
            _ => self.metrics.inc_poi_fallback(),
        }
        Ok(planned)
    }
}

fn fallback_plan(maps: &MapsService, request: &TripRequest, keyword: &str) -> PlannedTrip {
    let pois = maps.pois.search_pois(keyword, &request.city, true);
    info!(keyword, pois = pois.len(), "map data fallback");

    match build_fallback_itinerary(request, &pois, keyword) {
        Some(itinerary) => PlannedTrip {
            itinerary,
            source: PlanSource::PoiFallback,
        },
        None => PlannedTrip {
            itinerary: build_template_itinerary(request),
            source: PlanSource::Template,
        },
    }
}

fn planner_join_error(err: JoinError) -> OrchestratorError {
    if err.is_panic() {
        OrchestratorError::PlannerPanicked(panic_message(err.into_panic()))
    } else {
        OrchestratorError::Worker(err.to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
