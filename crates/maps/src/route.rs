use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use tripweave_core::{RawPayload, RouteMode, RouteSummary, ToolCall};
use tripweave_payload::{as_float, as_int, decode, dig_first, first_text, FieldPath};

use crate::channel::ToolChannel;
use crate::LOG_PREVIEW_CHARS;

static COORDINATE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?\d+(?:\.\d+)?\s*,\s*-?\d+(?:\.\d+)?\s*$").expect("valid coordinate pattern")
});

const ROUTE_PATHS: &[FieldPath] = &[&["route"], &["data", "route"], &["result", "route"]];
const FLAT_DISTANCE_PATHS: &[FieldPath] = &[&["distance"], &["data", "distance"]];
const FLAT_DURATION_PATHS: &[FieldPath] = &[&["duration"], &["data", "duration"]];

const MAX_STEP_INSTRUCTIONS: usize = 4;

/// Provider operation for each (mode, coordinate-addressed) pair.
const OPERATIONS: &[(RouteMode, bool, &str)] = &[
    (RouteMode::Walking, true, "maps_direction_walking_by_coordinates"),
    (RouteMode::Driving, true, "maps_direction_driving_by_coordinates"),
    (RouteMode::Transit, true, "maps_direction_transit_integrated_by_coordinates"),
    (RouteMode::Walking, false, "maps_direction_walking_by_address"),
    (RouteMode::Driving, false, "maps_direction_driving_by_address"),
    (RouteMode::Transit, false, "maps_direction_transit_integrated_by_address"),
];

#[derive(Clone)]
pub struct RouteSummarizer {
    channel: Arc<dyn ToolChannel>,
}

#[derive(Debug, Default)]
struct RouteFigures {
    distance_meters: Option<f64>,
    duration_seconds: Option<i64>,
    steps: Vec<String>,
}

impl RouteSummarizer {
    pub fn new(channel: Arc<dyn ToolChannel>) -> Self {
        Self { channel }
    }

    /// Plans a route and condenses it into a summary. Never fails: transport
    /// and decode problems produce a summary with unknown figures.
    #[instrument(skip(self))]
    pub fn plan_route(
        &self,
        origin: &str,
        destination: &str,
        origin_city: Option<&str>,
        destination_city: Option<&str>,
        mode: RouteMode,
    ) -> RouteSummary {
        let by_coordinates = is_coordinate_text(origin) && is_coordinate_text(destination);
        let call = route_call(
            origin,
            destination,
            origin_city,
            destination_city,
            mode,
            by_coordinates,
        );

        let raw = match self.channel.call(&call) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, %mode, "route planning failed");
                return summarize(mode, RouteFigures::default(), Value::Null);
            }
        };
        debug!(preview = %raw.preview(LOG_PREVIEW_CHARS), "route payload");

        match decode(&raw) {
            Ok(decoded) => {
                let figures = extract_figures(&decoded);
                summarize(mode, figures, decoded)
            }
            Err(err) => {
                debug!(error = %err, "route payload not decodable");
                summarize(mode, RouteFigures::default(), raw_as_value(raw))
            }
        }
    }
}

pub fn is_coordinate_text(text: &str) -> bool {
    COORDINATE_TEXT.is_match(text)
}

fn operation_for(mode: RouteMode, by_coordinates: bool) -> &'static str {
    OPERATIONS
        .iter()
        .find(|(m, coords, _)| *m == mode && *coords == by_coordinates)
        .map(|(_, _, name)| *name)
        .unwrap_or("maps_direction_walking_by_address")
}

fn route_call(
    origin: &str,
    destination: &str,
    origin_city: Option<&str>,
    destination_city: Option<&str>,
    mode: RouteMode,
    by_coordinates: bool,
) -> ToolCall {
    let call = ToolCall::new(operation_for(mode, by_coordinates));
    if by_coordinates {
        return call
            .arg("origin", origin.trim())
            .arg("destination", destination.trim());
    }

    let mut call = call
        .arg("origin_address", origin)
        .arg("destination_address", destination);
    // Transit needs the city hints; the other modes resolve addresses better with them.
    if let Some(city) = origin_city.filter(|city| !city.is_empty()) {
        call = call.arg("origin_city", city);
    }
    if let Some(city) = destination_city.filter(|city| !city.is_empty()) {
        call = call.arg("destination_city", city);
    }
    call
}

fn extract_figures(decoded: &Value) -> RouteFigures {
    let mut figures = RouteFigures::default();

    if let Some(route) = dig_first(decoded, ROUTE_PATHS).filter(|route| route.is_object()) {
        if let Some(path) = first_entry(route, "paths") {
            figures.distance_meters = path.get("distance").and_then(as_float);
            figures.duration_seconds = path.get("duration").and_then(as_int);
            figures.steps = step_instructions(path);
        }

        if figures.distance_meters.is_none() && figures.duration_seconds.is_none() {
            if let Some(transit) = first_entry(route, "transits") {
                figures.distance_meters = transit.get("distance").and_then(as_float);
                figures.duration_seconds = transit.get("duration").and_then(as_int);
            }
        }
    }

    if figures.distance_meters.is_none() {
        figures.distance_meters = dig_first(decoded, FLAT_DISTANCE_PATHS).and_then(as_float);
    }
    if figures.duration_seconds.is_none() {
        figures.duration_seconds = dig_first(decoded, FLAT_DURATION_PATHS).and_then(as_int);
    }

    figures
}

fn first_entry<'a>(route: &'a Value, key: &str) -> Option<&'a Value> {
    route
        .get(key)?
        .as_array()?
        .first()
        .filter(|entry| entry.is_object())
}

fn step_instructions(path: &Value) -> Vec<String> {
    let Some(steps) = path.get("steps").and_then(Value::as_array) else {
        return Vec::new();
    };
    steps
        .iter()
        .filter_map(|step| first_text(step, &["instruction"]))
        .take(MAX_STEP_INSTRUCTIONS)
        .collect()
}

fn summarize(mode: RouteMode, figures: RouteFigures, raw: Value) -> RouteSummary {
    let mut human_summary = format!(
        "distance {}, {}",
        format_distance(figures.distance_meters),
        format_duration(figures.duration_seconds)
    );
    if !figures.steps.is_empty() {
        human_summary.push_str("; directions: ");
        human_summary.push_str(&figures.steps.join(" / "));
    }

    RouteSummary {
        mode,
        distance_meters: figures.distance_meters,
        duration_seconds: figures.duration_seconds,
        step_instructions: figures.steps,
        human_summary,
        raw,
    }
}

fn raw_as_value(raw: RawPayload) -> Value {
    match raw {
        RawPayload::Value(value) => value,
        RawPayload::Text(text) => Value::String(text),
    }
}

/// Meters below one kilometer, kilometers with one decimal above.
pub fn format_distance(distance_meters: Option<f64>) -> String {
    match distance_meters {
        None => "unknown distance".to_string(),
        Some(meters) if meters >= 1000.0 => format!("{:.1} km", meters / 1000.0),
        Some(meters) => format!("{} m", meters.round() as i64),
    }
}

pub fn format_duration(duration_seconds: Option<i64>) -> String {
    let Some(seconds) = duration_seconds else {
        return "unknown duration".to_string();
    };

    let minutes = ((seconds as f64 / 60.0).round() as i64).max(1);
    if minutes < 60 {
        return format!("about {}", plural(minutes, "minute"));
    }

    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("about {}", plural(hours, "hour"))
    } else {
        format!("about {} {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
