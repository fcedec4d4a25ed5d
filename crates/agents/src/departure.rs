use tracing::{debug, info};
use tripweave_core::{GpsFix, RouteMode, TripRequest};
use tripweave_maps::MapsService;

/// Travel note from the traveller's GPS fix to the destination airport.
/// `None` when the request carries no location.
pub fn departure_note(
    maps: &MapsService,
    request: &TripRequest,
    airport_keyword: &str,
) -> Option<String> {
    let fix = request.gps_fix()?;
    let accuracy = accuracy_suffix(&fix);

    let candidates = maps.pois.limits().first_poi_candidates;
    let Some(airport) = maps
        .pois
        .find_first_poi(airport_keyword, &request.city, true, candidates)
    else {
        info!(city = %request.city, "no airport found for departure note");
        return Some(format!(
            "Departure from your GPS location{accuracy}: your current position was received, \
             but no airport could be found in {}. The itinerary covers the destination city only.",
            request.city
        ));
    };

    let airport_name = if airport.name.trim().is_empty() {
        format!("{} airport", request.city)
    } else {
        airport.name.clone()
    };

    let origin = format!("{},{}", fix.longitude, fix.latitude);
    let route = maps.routes.plan_route(
        &origin,
        &airport.location.to_coord_text(),
        None,
        Some(&request.city),
        RouteMode::Driving,
    );
    debug!(resolved = route.is_resolved(), airport = %airport_name, "departure route");

    let lead = format!(
        "Departure from your GPS location{accuracy}: from your current position to {airport_name} in {}.",
        request.city
    );
    if route.is_resolved() {
        Some(format!("{lead} {}", route.human_summary))
    } else {
        Some(format!(
            "{lead} The route could not be resolved; the itinerary continues with the destination city."
        ))
    }
}

fn accuracy_suffix(fix: &GpsFix) -> String {
    fix.accuracy_m
        .filter(|meters| meters.is_finite())
        .map(|meters| format!(" (±{}m)", meters.round() as i64))
        .unwrap_or_default()
}
