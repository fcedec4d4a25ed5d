use serde_json::Value;
use tripweave_core::GeoPoint;

/// One alternative key-path into a decoded payload. The empty path is the
/// payload itself.
pub type FieldPath = &'static [&'static str];

/// Walks nested objects by key. Missing keys, non-object steps and explicit
/// nulls all read as absent.
pub fn dig<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
        .filter(|found| !found.is_null())
}

/// First path in `paths` that resolves to a value.
pub fn dig_first<'a>(value: &'a Value, paths: &[FieldPath]) -> Option<&'a Value> {
    paths.iter().find_map(|path| dig(value, path))
}

/// First path in `paths` that resolves to an array.
pub fn first_list<'a>(value: &'a Value, paths: &[FieldPath]) -> Option<&'a Vec<Value>> {
    paths
        .iter()
        .find_map(|path| dig(value, path).and_then(Value::as_array))
}

pub fn as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

pub fn as_int(value: &Value) -> Option<i64> {
    let rounded = as_float(value)?.round();
    (rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64).then_some(rounded as i64)
}

/// Text view of a scalar field. Empty strings and empty arrays, which the
/// provider uses for "no value", read as absent.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// First of `keys` on `record` carrying a usable text value.
pub fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    let object = record.as_object()?;
    keys.iter()
        .find_map(|key| object.get(*key).and_then(as_text))
}

/// Accepts `{"longitude": .., "latitude": ..}` or `"<lng>,<lat>"`.
pub fn parse_geo_point(value: &Value) -> Option<GeoPoint> {
    match value {
        Value::Object(object) => {
            let longitude = as_float(object.get("longitude")?)?;
            let latitude = as_float(object.get("latitude")?)?;
            GeoPoint::new(longitude, latitude)
        }
        Value::String(text) => {
            let (lng, lat) = text.split_once(',')?;
            let longitude = lng.trim().parse::<f64>().ok()?;
            let latitude = lat.trim().parse::<f64>().ok()?;
            GeoPoint::new(longitude, latitude)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dig_walks_nested_maps() {
        let value = json!({"data": {"route": {"paths": []}}});
        assert_eq!(dig(&value, &["data", "route", "paths"]), Some(&json!([])));
        assert_eq!(dig(&value, &[]), Some(&value));
    }

    #[test]
    fn dig_is_absent_on_shape_mismatch() {
        let value = json!({"data": [1, 2], "empty": null});
        assert!(dig(&value, &["data", "pois"]).is_none());
        assert!(dig(&value, &["missing"]).is_none());
        assert!(dig(&value, &["empty"]).is_none());
        assert!(dig(&json!("text"), &["a"]).is_none());
    }

    #[test]
    fn first_list_tries_paths_in_order() {
        const PATHS: &[FieldPath] = &[&["pois"], &["data", "pois"], &[]];
        let nested = json!({"pois": "n/a", "data": {"pois": [{"id": 1}]}});
        assert_eq!(first_list(&nested, PATHS).map(Vec::len), Some(1));

        let bare = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(first_list(&bare, PATHS).map(Vec::len), Some(2));

        assert!(first_list(&json!({"other": []}), PATHS).is_none());
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(as_float(&json!(1500)), Some(1500.0));
        assert_eq!(as_float(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(as_float(&json!("")), None);
        assert_eq!(as_float(&json!("abc")), None);
        assert_eq!(as_float(&json!("inf")), None);
        assert_eq!(as_float(&json!([])), None);
        assert_eq!(as_int(&json!("1799.6")), Some(1800));
        assert_eq!(as_int(&json!(null)), None);
    }

    #[test]
    fn text_fields_skip_empty_markers() {
        let record = json!({"id": "", "poi_id": [], "uid": 42, "name": "Museum"});
        assert_eq!(first_text(&record, &["id", "poi_id", "uid"]), Some("42".to_string()));
        assert_eq!(first_text(&record, &["name"]), Some("Museum".to_string()));
        assert_eq!(first_text(&record, &["tel"]), None);
    }

    #[test]
    fn geo_point_from_text() {
        let point = parse_geo_point(&json!("116.4,39.9")).unwrap();
        assert_eq!(point.longitude, 116.4);
        assert_eq!(point.latitude, 39.9);
        assert!(parse_geo_point(&json!("not-a-point")).is_none());
        assert!(parse_geo_point(&json!("116.4;39.9")).is_none());
        assert!(parse_geo_point(&json!("116.4,")).is_none());
    }

    #[test]
    fn geo_point_from_map() {
        let point = parse_geo_point(&json!({"longitude": "120.15", "latitude": 30.28})).unwrap();
        assert_eq!(point.longitude, 120.15);
        assert_eq!(point.latitude, 30.28);
        assert!(parse_geo_point(&json!({"longitude": 120.15})).is_none());
        assert!(parse_geo_point(&json!(42)).is_none());
    }
}
