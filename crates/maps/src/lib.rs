mod channel;
mod places;
mod poi;
mod route;

use std::sync::Arc;

pub use channel::{ReplayChannel, ToolChannel, TransportError};
pub use places::PlaceLookup;
pub use poi::{PoiResolver, ResolverLimits};
pub use route::{format_distance, format_duration, is_coordinate_text, RouteSummarizer};

pub const TEXT_SEARCH: &str = "maps_text_search";
pub const SEARCH_DETAIL: &str = "maps_search_detail";
pub const WEATHER: &str = "maps_weather";
pub const GEOCODE: &str = "maps_geo";

/// Characters of a raw payload echoed into debug logs.
const LOG_PREVIEW_CHARS: usize = 200;

/// The provider-facing services sharing one injected tool channel.
#[derive(Clone)]
pub struct MapsService {
    pub pois: PoiResolver,
    pub routes: RouteSummarizer,
    pub places: PlaceLookup,
}

impl MapsService {
    pub fn new(channel: Arc<dyn ToolChannel>, limits: ResolverLimits) -> Self {
        Self {
            pois: PoiResolver::new(channel.clone(), limits),
            routes: RouteSummarizer::new(channel.clone()),
            places: PlaceLookup::new(channel),
        }
    }
}
