use anyhow::Result;
use tripweave_core::{build_template_itinerary, Itinerary, TripRequest};

/// Long-running itinerary generator. Called from a blocking worker, so
/// implementations may block freely.
pub trait TripPlanner: Send + Sync {
    fn plan_trip(&self, request: &TripRequest) -> Result<Itinerary>;
}

/// Deterministic planner producing the static day template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePlanner;

impl TripPlanner for TemplatePlanner {
    fn plan_trip(&self, request: &TripRequest) -> Result<Itinerary> {
        Ok(build_template_itinerary(request))
    }
}
