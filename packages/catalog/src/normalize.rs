//! Catalog record normalization.
//!
//! The USGS feed routinely contains partial records: features with no
//! properties, no geometry, or null `mag`/`time` values. Those are dropped
//! here, record by record, so one bad entry never poisons a report.

use chrono::{FixedOffset, TimeZone as _, Utc};
use geojson::{Feature, FeatureCollection};
use quake_map_event_models::NormalizedEvent;

/// Place text used when a record carries no locality description.
const UNKNOWN_PLACE: &str = "Unknown location";

/// Normalizes every usable record in a catalog response.
///
/// Catalog order is preserved. Origin times are converted from epoch
/// milliseconds into the given fixed offset; depth is rounded to 2 decimal
/// places and coordinates to 4.
#[must_use]
pub fn normalize_events(
    collection: &FeatureCollection,
    offset: FixedOffset,
) -> Vec<NormalizedEvent> {
    let total = collection.features.len();
    let mut events = Vec::with_capacity(total);

    for feature in &collection.features {
        let Some(event) = normalize_feature(feature, offset) else {
            continue;
        };
        events.push(event);
    }

    let skipped = total - events.len();
    if skipped > 0 {
        log::warn!("Skipped {skipped} incomplete records of {total}");
    }
    log::info!("Normalized {} of {total} catalog records", events.len());

    events
}

/// Normalizes one record, or `None` when any required field is missing.
fn normalize_feature(feature: &Feature, offset: FixedOffset) -> Option<NormalizedEvent> {
    let properties = feature.properties.as_ref()?;
    let geometry = feature.geometry.as_ref()?;

    // Epicenters are always points: [longitude, latitude, depth_km].
    let geojson::Value::Point(coordinates) = &geometry.value else {
        return None;
    };
    if coordinates.len() < 3 {
        return None;
    }
    let longitude = coordinates[0];
    let latitude = coordinates[1];
    let depth_km = coordinates[2];

    let magnitude = properties.get("mag")?.as_f64()?;
    let time_ms = properties.get("time")?.as_i64()?;
    let place = properties
        .get("place")
        .and_then(|value| value.as_str())
        .unwrap_or(UNKNOWN_PLACE);

    let time = Utc
        .timestamp_millis_opt(time_ms)
        .single()?
        .with_timezone(&offset);

    Some(NormalizedEvent::new(
        time, place, magnitude, depth_km, latitude, longitude,
    ))
}
