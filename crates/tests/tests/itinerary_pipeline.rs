use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tripweave_agents::{OrchestratorConfig, PlanSource, TemplatePlanner, TripOrchestrator};
use tripweave_core::{RouteMode, TripRequest};
use tripweave_maps::{MapsService, ReplayChannel, ResolverLimits, SEARCH_DETAIL};
use tripweave_observability::AppMetrics;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn beijing_channel() -> ReplayChannel {
    ReplayChannel::from_json_file(fixture("beijing.json")).expect("fixture should load")
}

fn trip_request() -> Result<TripRequest> {
    let raw = std::fs::read_to_string(fixture("trip_request.json"))?;
    Ok(serde_json::from_str(&raw)?)
}

#[test]
fn fixture_search_backfills_missing_coordinates() {
    let channel = beijing_channel();
    let maps = MapsService::new(Arc::new(channel.clone()), ResolverLimits::default());

    let pois = maps.pois.search_pois("景点", "Beijing", true);

    let names: Vec<&str> = pois.iter().map(|poi| poi.name.as_str()).collect();
    assert_eq!(
        names,
        ["The Palace Museum", "Temple of Heaven", "Summer Palace", "Beihai Park"]
    );
    assert_eq!(pois[2].address, "19 Xinjiangongmen Rd");
    assert_eq!(pois[2].location.to_coord_text(), "116.275179,39.999617");
    assert_eq!(channel.call_count(SEARCH_DETAIL), 1);
}

#[test]
fn fixture_routes_and_places() {
    let channel = beijing_channel();
    let maps = MapsService::new(Arc::new(channel), ResolverLimits::default());

    let walk = maps.routes.plan_route(
        "Wangfujing",
        "Jingshan Park",
        Some("Beijing"),
        Some("Beijing"),
        RouteMode::Walking,
    );
    assert_eq!(walk.human_summary, "distance 850 m, about 10 minutes");

    let weather = maps.places.weather("Beijing").expect("weather payload");
    assert_eq!(weather["forecasts"][0]["dayweather"], "Sunny");

    let point = maps.places.geocode("Wangjing SOHO", Some("Beijing")).expect("geocode");
    assert_eq!(point.to_coord_text(), "116.481488,39.990464");
}

#[tokio::test]
async fn fallback_plan_with_departure_note() -> Result<()> {
    let channel = beijing_channel();
    let metrics = AppMetrics::shared();
    let orchestrator = TripOrchestrator::new(
        Arc::new(channel),
        Arc::new(TemplatePlanner),
        OrchestratorConfig::default(),
        metrics.clone(),
    );

    let planned = orchestrator.plan(trip_request()?).await?;
    let itinerary = &planned.itinerary;

    assert_eq!(planned.source, PlanSource::PoiFallback);
    assert_eq!(itinerary.days.len(), 2);
    assert_eq!(itinerary.days[0].date, "2026-11-02");
    assert_eq!(itinerary.days[1].date, "2026-11-03");
    assert_eq!(itinerary.days[1].attractions[0].name, "Summer Palace");
    assert_eq!(itinerary.days[1].accommodation, "boutique hotel");
    assert!(itinerary.days.iter().all(|day| day.meals.len() == 3));

    assert!(itinerary.suggestions.starts_with(
        "Departure from your GPS location (±15m): from your current position to \
         Beijing Capital International Airport in Beijing. distance 31.5 km, about 49 minutes; \
         directions: Head east on Chang'an Ave / Take the Airport Expressway / Follow signs to Terminal 3\n\n"
    ));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.requests_total, 1);
    assert_eq!(snapshot.poi_fallback_total, 1);
    Ok(())
}

#[tokio::test]
async fn template_planner_as_model_plan() -> Result<()> {
    let config = OrchestratorConfig {
        planner_api_key: Some("sk-local".to_string()),
        ..OrchestratorConfig::default()
    };
    let orchestrator = TripOrchestrator::new(
        Arc::new(beijing_channel()),
        Arc::new(TemplatePlanner),
        config,
        AppMetrics::shared(),
    );

    let mut request = trip_request()?;
    request.sensor_context = None;
    let planned = orchestrator.plan(request).await?;

    assert_eq!(planned.source, PlanSource::Model);
    assert!(planned.itinerary.days.iter().all(|day| day.attractions.is_empty()));
    Ok(())
}
