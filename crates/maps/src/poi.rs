use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use tripweave_core::{GeoPoint, PointOfInterest, ToolCall};
use tripweave_payload::{decode, dig, first_list, first_text, parse_geo_point, FieldPath};

use crate::channel::ToolChannel;
use crate::{LOG_PREVIEW_CHARS, SEARCH_DETAIL, TEXT_SEARCH};

/// Known locations of the candidate list in a search response.
const CANDIDATE_PATHS: &[FieldPath] = &[&["pois"], &["data", "pois"], &["results"], &[]];

/// Known locations of the record in a detail response, most nested first.
const DETAIL_RECORD_PATHS: &[FieldPath] = &[&["data"], &["poi"]];

const ID_KEYS: &[&str] = &["id", "poi_id", "uid"];
const CATEGORY_KEYS: &[&str] = &["type", "typecode"];
const ADDRESS_KEYS: &[&str] = &["address", "addr"];
const LOCATION_KEYS: &[&str] = &["location", "lnglat"];

/// Caps on how much secondary lookup work a single search may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverLimits {
    pub max_pois: usize,
    pub first_poi_candidates: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            max_pois: 15,
            first_poi_candidates: 5,
        }
    }
}

#[derive(Clone)]
pub struct PoiResolver {
    channel: Arc<dyn ToolChannel>,
    limits: ResolverLimits,
}

/// A search hit before its coordinate is known to exist.
struct Candidate {
    id: String,
    name: String,
    category: String,
    address: String,
    location: Option<GeoPoint>,
    phone: Option<String>,
}

impl Candidate {
    fn from_record(record: &Value) -> Self {
        Self {
            id: first_text(record, ID_KEYS).unwrap_or_default(),
            name: first_text(record, &["name"]).unwrap_or_default(),
            category: first_text(record, CATEGORY_KEYS).unwrap_or_default(),
            address: first_text(record, ADDRESS_KEYS).unwrap_or_default(),
            location: location_of(record),
            phone: first_text(record, &["tel"]),
        }
    }

    fn merge_detail(&mut self, detail: &Value) {
        self.location = detail.get("location").and_then(parse_geo_point);
        if let Some(category) = first_text(detail, &["type"]) {
            self.category = category;
        }
        if let Some(name) = first_text(detail, &["name"]) {
            self.name = name;
        }
        if let Some(address) = first_text(detail, &["address"]) {
            self.address = address;
        }
    }

    fn into_poi(self) -> Option<PointOfInterest> {
        Some(PointOfInterest {
            id: self.id,
            name: self.name,
            category: self.category,
            address: self.address,
            location: self.location?,
            phone: self.phone,
        })
    }
}

impl PoiResolver {
    pub fn new(channel: Arc<dyn ToolChannel>, limits: ResolverLimits) -> Self {
        Self { channel, limits }
    }

    pub fn limits(&self) -> ResolverLimits {
        self.limits
    }

    /// Keyword search returning at most `max_pois` records, all with a
    /// coordinate. Any failure yields an empty list.
    #[instrument(skip(self))]
    pub fn search_pois(
        &self,
        keywords: &str,
        city: &str,
        city_limited: bool,
    ) -> Vec<PointOfInterest> {
        let Some(records) = self.search_records(keywords, city, city_limited) else {
            return Vec::new();
        };

        let mut resolved = Vec::new();
        for record in records.iter().filter(|record| record.is_object()) {
            if let Some(poi) = self.resolve_candidate(record) {
                resolved.push(poi);
            }
            if resolved.len() >= self.limits.max_pois {
                break;
            }
        }

        debug!(
            keywords,
            city,
            candidates = records.len(),
            resolved = resolved.len(),
            "poi search resolved"
        );
        resolved
    }

    /// First candidate among the leading `max_candidates` that resolves to a
    /// coordinate.
    #[instrument(skip(self))]
    pub fn find_first_poi(
        &self,
        keywords: &str,
        city: &str,
        city_limited: bool,
        max_candidates: usize,
    ) -> Option<PointOfInterest> {
        let records = self.search_records(keywords, city, city_limited)?;

        let found = records
            .iter()
            .filter(|record| record.is_object())
            .take(max_candidates)
            .find_map(|record| self.resolve_candidate(record));

        if found.is_none() {
            debug!(keywords, city, max_candidates, "no candidate resolved");
        }
        found
    }

    /// Decoded detail record for `poi_id`, or `None` when the lookup fails.
    #[instrument(skip(self))]
    pub fn poi_detail(&self, poi_id: &str) -> Option<Value> {
        let call = ToolCall::new(SEARCH_DETAIL).arg("id", poi_id);
        let raw = match self.channel.call(&call) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, poi_id, "poi detail lookup failed");
                return None;
            }
        };
        debug!(preview = %raw.preview(LOG_PREVIEW_CHARS), "poi detail payload");

        let decoded = match decode(&raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!(error = %err, poi_id, "poi detail payload not decodable");
                return None;
            }
        };

        let record = DETAIL_RECORD_PATHS
            .iter()
            .filter_map(|path| dig(&decoded, path))
            .find(|record| record.is_object())
            .cloned();
        match record {
            Some(record) => Some(record),
            None if decoded.is_object() => Some(decoded),
            None => None,
        }
    }

    fn search_records(
        &self,
        keywords: &str,
        city: &str,
        city_limited: bool,
    ) -> Option<Vec<Value>> {
        let call = ToolCall::new(TEXT_SEARCH)
            .arg("keywords", keywords)
            .arg("city", city)
            .arg("citylimit", city_limited.to_string());

        let raw = match self.channel.call(&call) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, keywords, city, "poi search failed");
                return None;
            }
        };
        debug!(preview = %raw.preview(LOG_PREVIEW_CHARS), "poi search payload");

        let decoded = match decode(&raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(error = %err, keywords, city, "poi search payload not decodable");
                return None;
            }
        };

        first_list(&decoded, CANDIDATE_PATHS)
            .filter(|records| !records.is_empty())
            .cloned()
    }

    /// Builds a POI from a search record, issuing at most one detail lookup
    /// when the record has an id but no coordinate.
    fn resolve_candidate(&self, record: &Value) -> Option<PointOfInterest> {
        let mut candidate = Candidate::from_record(record);

        if candidate.location.is_none() && !candidate.id.is_empty() {
            if let Some(detail) = self.poi_detail(&candidate.id) {
                candidate.merge_detail(&detail);
            }
        }

        candidate.into_poi()
    }
}

fn location_of(record: &Value) -> Option<GeoPoint> {
    let object = record.as_object()?;
    LOCATION_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !is_blank(value))
        .and_then(parse_geo_point)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
