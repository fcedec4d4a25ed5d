use chrono::{Duration, Local, NaiveDate};

use crate::models::{Attraction, DayPlan, Itinerary, Meal, MealKind, PointOfInterest, TripRequest};

const DATE_FORMAT: &str = "%Y-%m-%d";
const VISIT_DURATION_MINUTES: u32 = 120;

const FALLBACK_SUGGESTIONS: &str = "This itinerary was assembled directly from map POI search results without model assistance; adjust the order to taste.";
const TEMPLATE_SUGGESTIONS: &str = "No points of interest could be retrieved for this city, so a generic day-by-day template is shown; plan each day around the local highlights.";

/// Builds a day-by-day itinerary straight from POI search results.
///
/// Returns `None` when `pois` is empty; callers fall back to
/// [`build_template_itinerary`] in that case.
pub fn build_fallback_itinerary(
    request: &TripRequest,
    pois: &[PointOfInterest],
    keyword: &str,
) -> Option<Itinerary> {
    build_fallback_itinerary_from(request, pois, keyword, Local::now().date_naive())
}

fn build_fallback_itinerary_from(
    request: &TripRequest,
    pois: &[PointOfInterest],
    keyword: &str,
    today: NaiveDate,
) -> Option<Itinerary> {
    if pois.is_empty() {
        return None;
    }

    let per_day = if request.travel_days == 1 { 3 } else { 2 };
    let start = anchor_date(&request.start_date, today);

    let mut offset = 0usize;
    let mut days = Vec::new();
    for day_index in 0..request.travel_days {
        let mut day_pois = slice_from(pois, offset, per_day);
        if day_pois.is_empty() {
            day_pois = slice_from(pois, 0, per_day);
        }
        offset += per_day;

        days.push(DayPlan {
            date: day_date(start, day_index),
            day_index,
            description: format!("Day {}: based on map POI search ({})", day_index + 1, keyword),
            transportation: request.transportation.clone(),
            accommodation: request.accommodation.clone(),
            attractions: day_pois.iter().map(attraction_from_poi).collect(),
            meals: standard_meals(),
        });
    }

    Some(Itinerary {
        city: request.city.clone(),
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        days,
        weather_info: Vec::new(),
        suggestions: FALLBACK_SUGGESTIONS.to_string(),
    })
}

/// Static plan used when no POI data is available at all.
pub fn build_template_itinerary(request: &TripRequest) -> Itinerary {
    let start = anchor_date(&request.start_date, Local::now().date_naive());

    let days = (0..request.travel_days)
        .map(|day_index| DayPlan {
            date: day_date(start, day_index),
            day_index,
            description: format!(
                "Day {}: explore {} at an easy pace",
                day_index + 1,
                request.city
            ),
            transportation: request.transportation.clone(),
            accommodation: request.accommodation.clone(),
            attractions: Vec::new(),
            meals: standard_meals(),
        })
        .collect();

    Itinerary {
        city: request.city.clone(),
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        days,
        weather_info: Vec::new(),
        suggestions: TEMPLATE_SUGGESTIONS.to_string(),
    }
}

/// Placeholder meal slots; costs are fixed estimates, not POI data.
pub fn standard_meals() -> Vec<Meal> {
    vec![
        meal(
            MealKind::Breakfast,
            "Breakfast suggestion",
            "Pick a place near where the day starts",
            30,
        ),
        meal(
            MealKind::Lunch,
            "Lunch suggestion",
            "Pick a place around the midpoint of the day's route",
            50,
        ),
        meal(
            MealKind::Dinner,
            "Dinner suggestion",
            "Pick a place near where the day ends",
            80,
        ),
    ]
}

fn attraction_from_poi(poi: &PointOfInterest) -> Attraction {
    let description = if poi.category.is_empty() {
        "From map POI search".to_string()
    } else {
        format!("From map POI search: {}", poi.category)
    };

    Attraction {
        name: poi.name.clone(),
        address: poi.address.clone(),
        location: poi.location,
        visit_duration_minutes: VISIT_DURATION_MINUTES,
        description,
        category: "attraction".to_string(),
        poi_id: Some(poi.id.clone()).filter(|id| !id.is_empty()),
    }
}

fn slice_from(pois: &[PointOfInterest], offset: usize, len: usize) -> &[PointOfInterest] {
    if offset >= pois.len() {
        return &[];
    }
    let end = (offset + len).min(pois.len());
    &pois[offset..end]
}

fn anchor_date(start_date: &str, today: NaiveDate) -> NaiveDate {
    NaiveDate::parse_from_str(start_date.trim(), DATE_FORMAT).unwrap_or(today)
}

fn day_date(start: NaiveDate, day_index: u32) -> String {
    (start + Duration::days(i64::from(day_index)))
        .format(DATE_FORMAT)
        .to_string()
}

fn meal(kind: MealKind, name: &str, description: &str, estimated_cost: u32) -> Meal {
    Meal {
        kind,
        name: name.to_string(),
        description: description.to_string(),
        estimated_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn request(days: u32, start: &str) -> TripRequest {
        TripRequest {
            city: "Beijing".to_string(),
            start_date: start.to_string(),
            end_date: "2026-05-03".to_string(),
            travel_days: days,
            transportation: "public transit".to_string(),
            accommodation: "hotel".to_string(),
            preferences: Vec::new(),
            free_text_input: None,
            sensor_context: None,
        }
    }

    fn pois(count: usize) -> Vec<PointOfInterest> {
        (0..count)
            .map(|idx| PointOfInterest {
                id: format!("B{idx:03}"),
                name: format!("Spot {idx}"),
                category: "scenic".to_string(),
                address: format!("{idx} Main St"),
                location: GeoPoint {
                    longitude: 116.0 + idx as f64 * 0.01,
                    latitude: 39.9,
                },
                phone: None,
            })
            .collect()
    }

    #[test]
    fn three_days_six_pois_gives_two_per_day() {
        let plan = build_fallback_itinerary(&request(3, "2026-05-01"), &pois(6), "parks").unwrap();

        assert_eq!(plan.days.len(), 3);
        for day in &plan.days {
            assert_eq!(day.attractions.len(), 2);
            assert_eq!(day.meals.len(), 3);
        }
        assert_eq!(plan.days[1].attractions[0].name, "Spot 2");
        assert_eq!(plan.days[2].attractions[1].name, "Spot 5");
    }

    #[test]
    fn single_day_takes_three() {
        let plan = build_fallback_itinerary(&request(1, "2026-05-01"), &pois(5), "parks").unwrap();
        assert_eq!(plan.days.len(), 1);
        assert_eq!(plan.days[0].attractions.len(), 3);
    }

    #[test]
    fn single_poi_never_leaves_a_day_empty() {
        let plan = build_fallback_itinerary(&request(3, "2026-05-01"), &pois(1), "parks").unwrap();
        assert_eq!(plan.days.len(), 3);
        assert!(plan.days.iter().all(|day| !day.attractions.is_empty()));
    }

    #[test]
    fn dates_are_consecutive_from_start() {
        let plan = build_fallback_itinerary(&request(3, "2026-02-27"), &pois(6), "parks").unwrap();
        let dates = plan.days.iter().map(|d| d.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2026-02-27", "2026-02-28", "2026-03-01"]);
        let indexes = plan.days.iter().map(|d| d.day_index).collect::<Vec<_>>();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn unparsable_start_date_anchors_on_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let plan =
            build_fallback_itinerary_from(&request(3, "next friday"), &pois(2), "parks", today)
                .unwrap();
        let dates = plan.days.iter().map(|d| d.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2026-10-19", "2026-10-20", "2026-10-21"]);
    }

    #[test]
    fn meals_have_fixed_costs() {
        let meals = standard_meals();
        let kinds = meals.iter().map(|m| m.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![MealKind::Breakfast, MealKind::Lunch, MealKind::Dinner]
        );
        let costs = meals.iter().map(|m| m.estimated_cost).collect::<Vec<_>>();
        assert_eq!(costs, vec![30, 50, 80]);
    }

    #[test]
    fn empty_pois_yield_none() {
        assert!(build_fallback_itinerary(&request(2, "2026-05-01"), &[], "parks").is_none());
    }

    #[test]
    fn template_matches_requested_day_count() {
        let plan = build_template_itinerary(&request(4, "2026-05-01"));
        assert_eq!(plan.days.len(), 4);
        assert!(plan.days.iter().all(|day| day.meals.len() == 3));
        assert_eq!(plan.days[3].date, "2026-05-04");
    }

    #[test]
    fn attraction_copies_poi_fields() {
        let plan = build_fallback_itinerary(&request(1, "2026-05-01"), &pois(1), "parks").unwrap();
        let attraction = &plan.days[0].attractions[0];
        assert_eq!(attraction.poi_id.as_deref(), Some("B000"));
        assert_eq!(attraction.visit_duration_minutes, 120);
        assert_eq!(attraction.description, "From map POI search: scenic");
        assert!(plan.suggestions.contains("without model assistance"));
    }
}
