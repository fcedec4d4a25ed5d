use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use tripweave_core::{GeoPoint, ToolCall};
use tripweave_payload::{decode, dig_first, parse_geo_point, FieldPath};

use crate::channel::ToolChannel;
use crate::{GEOCODE, LOG_PREVIEW_CHARS, WEATHER};

const GEOCODE_PATHS: &[FieldPath] = &[
    &["geocodes"],
    &["data", "geocodes"],
    &["results"],
    &["return"],
];

/// City-level lookups that pass provider data through with minimal shaping.
#[derive(Clone)]
pub struct PlaceLookup {
    channel: Arc<dyn ToolChannel>,
}

impl PlaceLookup {
    pub fn new(channel: Arc<dyn ToolChannel>) -> Self {
        Self { channel }
    }

    /// Decoded weather payload for `city`, untouched.
    #[instrument(skip(self))]
    pub fn weather(&self, city: &str) -> Option<Value> {
        let call = ToolCall::new(WEATHER).arg("city", city);
        let raw = match self.channel.call(&call) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "weather lookup failed");
                return None;
            }
        };
        debug!(preview = %raw.preview(LOG_PREVIEW_CHARS), "weather payload");
        decode(&raw).ok()
    }

    /// Coordinates of the best geocode match for `address`.
    #[instrument(skip(self))]
    pub fn geocode(&self, address: &str, city: Option<&str>) -> Option<GeoPoint> {
        let mut call = ToolCall::new(GEOCODE).arg("address", address);
        if let Some(city) = city.filter(|city| !city.is_empty()) {
            call = call.arg("city", city);
        }

        let raw = match self.channel.call(&call) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "geocode failed");
                return None;
            }
        };
        let decoded = decode(&raw).ok()?;

        let first = dig_first(&decoded, GEOCODE_PATHS)?.as_array()?.first()?;
        parse_geo_point(first.get("location")?)
    }
}
