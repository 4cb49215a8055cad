//! Geo query and sort fragments

use super::{filter_options, single};
use crate::query::types::{GeoPoint, Options};
use serde_json::{Map, Value};

/// Pseudo-field the engine sorts on for distance-from-point ordering
pub const GEO_DISTANCE_SORT_FIELD: &str = "_geo_distance";

pub const GEO_DISTANCE_OPTIONS: &[&str] = &[
    "distance_type",
    "validation_method",
    "ignore_unmapped",
    "boost",
    "_name",
];
pub const GEO_BOUNDING_BOX_OPTIONS: &[&str] = &["validation_method", "ignore_unmapped", "boost", "_name"];
pub const GEO_SORT_OPTIONS: &[&str] = &["unit", "mode", "distance_type", "ignore_unmapped"];

/// `geo_distance` query
pub fn geo_distance(field: &str, point: &GeoPoint, distance: &str, options: &Options) -> Value {
    let mut body = filter_options(options, GEO_DISTANCE_OPTIONS);
    body.insert("distance".to_string(), Value::from(distance));
    body.insert(field.to_string(), point.to_value());
    single("geo_distance", body)
}

/// `geo_bounding_box` query
pub fn geo_bounding_box(
    field: &str,
    top_left: &GeoPoint,
    bottom_right: &GeoPoint,
    options: &Options,
) -> Value {
    let mut corners = Map::new();
    corners.insert("top_left".to_string(), top_left.to_value());
    corners.insert("bottom_right".to_string(), bottom_right.to_value());

    let mut body = filter_options(options, GEO_BOUNDING_BOX_OPTIONS);
    body.insert(field.to_string(), Value::Object(corners));
    single("geo_bounding_box", body)
}

/// `_geo_distance` sort entry; `unit` defaults to `default_unit`
pub fn geo_distance_sort(
    field: &str,
    point: &GeoPoint,
    order: &str,
    default_unit: &str,
    options: &Options,
) -> Value {
    let mut body = filter_options(options, GEO_SORT_OPTIONS);
    body.entry("unit".to_string())
        .or_insert_with(|| Value::from(default_unit));
    body.insert("order".to_string(), Value::from(order));
    body.insert(field.to_string(), point.to_value());
    single(GEO_DISTANCE_SORT_FIELD, body)
}
