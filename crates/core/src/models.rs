use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Blob handed back by the tool channel, either already structured or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPayload {
    Value(Value),
    Text(String),
}

impl RawPayload {
    /// Short preview used in debug logs.
    pub fn preview(&self, max_chars: usize) -> String {
        let text = match self {
            Self::Value(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        };
        if text.chars().count() <= max_chars {
            text
        } else {
            text.chars().take(max_chars).collect::<String>() + "..."
        }
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for RawPayload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawPayload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A single invocation of a provider operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub operation: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            arguments: Map::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    pub fn argument_text(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Returns `None` unless both components are finite.
    pub fn new(longitude: f64, latitude: f64) -> Option<Self> {
        (longitude.is_finite() && latitude.is_finite()).then_some(Self {
            longitude,
            latitude,
        })
    }

    /// Provider coordinate notation, `"<lng>,<lat>"`.
    pub fn to_coord_text(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub location: GeoPoint,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Walking,
    Driving,
    Transit,
}

impl RouteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Driving => "driving",
            Self::Transit => "transit",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown route mode '{0}', expected walking, driving or transit")]
pub struct UnknownRouteMode(pub String);

impl FromStr for RouteMode {
    type Err = UnknownRouteMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "walking" | "walk" => Ok(Self::Walking),
            "driving" | "drive" | "car" => Ok(Self::Driving),
            "transit" | "bus" | "public" => Ok(Self::Transit),
            other => Err(UnknownRouteMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub mode: RouteMode,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<i64>,
    pub step_instructions: Vec<String>,
    pub human_summary: String,
    /// Decoded provider payload, the raw text when decoding failed, or null.
    pub raw: Value,
}

impl RouteSummary {
    pub fn is_resolved(&self) -> bool {
        self.distance_meters.is_some()
            || self.duration_seconds.is_some()
            || !self.step_instructions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub visit_duration_minutes: u32,
    pub description: String,
    pub category: String,
    pub poi_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "type")]
    pub kind: MealKind,
    pub name: String,
    pub description: String,
    pub estimated_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: String,
    pub day_index: u32,
    pub description: String,
    pub transportation: String,
    pub accommodation: String,
    pub attractions: Vec<Attraction>,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub date: String,
    pub day_weather: String,
    pub night_weather: String,
    pub day_temp: String,
    pub night_temp: String,
    pub wind_direction: String,
    pub wind_power: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub weather_info: Vec<WeatherInfo>,
    pub suggestions: String,
}

impl Itinerary {
    /// Puts `note` in front of the existing suggestions, separated by a blank line.
    pub fn prepend_suggestion(&mut self, note: &str) {
        let existing = self.suggestions.trim();
        self.suggestions = format!("{}\n\n{}", note, existing).trim().to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub longitude: f64,
    pub latitude: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorContext {
    pub location: Option<GpsFix>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub travel_days: u32,
    #[serde(default)]
    pub transportation: String,
    #[serde(default)]
    pub accommodation: String,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub free_text_input: Option<String>,
    #[serde(default)]
    pub sensor_context: Option<SensorContext>,
}

impl TripRequest {
    pub fn gps_fix(&self) -> Option<GpsFix> {
        self.sensor_context.as_ref().and_then(|ctx| ctx.location)
    }

    /// First stated preference, if any, used as the POI search keyword.
    pub fn primary_preference(&self) -> Option<&str> {
        self.preferences
            .first()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}
