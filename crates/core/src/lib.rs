pub mod models;
pub mod planner;

pub use models::*;
pub use planner::{build_fallback_itinerary, build_template_itinerary, standard_meals};
