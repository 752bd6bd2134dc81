#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the quake map server.
//!
//! These types are serialized to JSON for the REST API. Field names are
//! the wire contract; clients send and receive exactly these keys.

use chrono::NaiveDate;
use quake_map_catalog_models::QueryFilter;
use quake_map_event_models::NormalizedEvent;
use serde::{Deserialize, Serialize};

/// Body of the informational response when the catalog window is empty.
pub const NO_DATA_MESSAGE: &str = "No earthquake data found!";

/// A report request as posted by clients.
///
/// Dates are required and must be `YYYY-MM-DD`. The bound fields are
/// optional and accept either a JSON number or a numeric string; omitted
/// bounds fall back to the [`QueryFilter`] defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    /// First day of the query window.
    pub start_date: Option<String>,
    /// Last day of the query window.
    pub end_date: Option<String>,
    /// Lower magnitude bound.
    pub min_magnitude: Option<serde_json::Value>,
    /// Upper magnitude bound.
    pub max_magnitude: Option<serde_json::Value>,
    /// Southern edge of the bounding box, degrees.
    pub min_lat: Option<serde_json::Value>,
    /// Northern edge of the bounding box, degrees.
    pub max_lat: Option<serde_json::Value>,
    /// Western edge of the bounding box, degrees.
    pub min_lon: Option<serde_json::Value>,
    /// Eastern edge of the bounding box, degrees.
    pub max_lon: Option<serde_json::Value>,
}

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {message}")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl ReportRequest {
    /// Validates the request and builds the catalog filter from it.
    ///
    /// Fields are checked in declaration order and the first failure is
    /// returned. Bounds are not cross-checked against each other; an
    /// inverted pair is forwarded to the catalog as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a missing or malformed date, or a
    /// bound that is neither a number nor a numeric string.
    pub fn to_filter(&self) -> Result<QueryFilter, ValidationError> {
        let start_date = parse_date("start_date", self.start_date.as_deref())?;
        let end_date = parse_date("end_date", self.end_date.as_deref())?;

        let mut filter = QueryFilter::new(start_date, end_date);
        if let Some(value) = &self.min_magnitude {
            filter.min_magnitude = coerce_f64("min_magnitude", value)?;
        }
        if let Some(value) = &self.max_magnitude {
            filter.max_magnitude = coerce_f64("max_magnitude", value)?;
        }
        if let Some(value) = &self.min_lat {
            filter.min_latitude = coerce_f64("min_lat", value)?;
        }
        if let Some(value) = &self.max_lat {
            filter.max_latitude = coerce_f64("max_lat", value)?;
        }
        if let Some(value) = &self.min_lon {
            filter.min_longitude = coerce_f64("min_lon", value)?;
        }
        if let Some(value) = &self.max_lon {
            filter.max_longitude = coerce_f64("max_lon", value)?;
        }
        Ok(filter)
    }
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let Some(raw) = value else {
        return Err(ValidationError::new(field, "is required"));
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        ValidationError::new(field, format!("expected YYYY-MM-DD, got {trimmed:?}"))
    })
}

fn coerce_f64(field: &'static str, value: &serde_json::Value) -> Result<f64, ValidationError> {
    match value {
        serde_json::Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| ValidationError::new(field, "is out of range")),
        serde_json::Value::String(text) => {
            let trimmed = text.trim();
            let parsed: f64 = trimmed.parse().map_err(|_| {
                ValidationError::new(field, format!("expected a number, got {trimmed:?}"))
            })?;
            if parsed.is_finite() {
                Ok(parsed)
            } else {
                Err(ValidationError::new(field, "must be finite"))
            }
        }
        other => Err(ValidationError::new(
            field,
            format!("expected a number, got {other}"),
        )),
    }
}

/// Successful report response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    /// URL path of the rendered map image.
    pub image_url: String,
    /// The normalized events behind the image, in catalog order.
    pub table_data: Vec<NormalizedEvent>,
    /// Per-day frequency rows as `[date, count]` pairs, `Total` last.
    pub daily_counts: Vec<(String, u64)>,
}

/// Informational response carrying a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message text.
    pub message: String,
}

/// Error response for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// What went wrong.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use quake_map_catalog_models::QueryFilter;
    use serde_json::json;

    use super::*;

    fn request_from(value: serde_json::Value) -> ReportRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn dates_only_request_uses_documented_defaults() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
        }));

        let filter = request.to_filter().unwrap();

        assert_eq!(filter.start_date.to_string(), "2023-11-01");
        assert_eq!(filter.end_date.to_string(), "2023-11-30");
        assert!((filter.min_magnitude - QueryFilter::DEFAULT_MIN_MAGNITUDE).abs() < f64::EPSILON);
        assert!((filter.max_magnitude - QueryFilter::DEFAULT_MAX_MAGNITUDE).abs() < f64::EPSILON);
        assert!((filter.min_latitude - QueryFilter::DEFAULT_MIN_LATITUDE).abs() < f64::EPSILON);
        assert!((filter.max_longitude - QueryFilter::DEFAULT_MAX_LONGITUDE).abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_accept_numbers_and_numeric_strings() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "min_magnitude": 4.0,
            "max_magnitude": " 6.5 ",
            "min_lat": "26.0",
            "max_lat": 31,
            "min_lon": 80.0,
            "max_lon": "88.5",
        }));

        let filter = request.to_filter().unwrap();

        assert!((filter.min_magnitude - 4.0).abs() < f64::EPSILON);
        assert!((filter.max_magnitude - 6.5).abs() < f64::EPSILON);
        assert!((filter.min_latitude - 26.0).abs() < f64::EPSILON);
        assert!((filter.max_latitude - 31.0).abs() < f64::EPSILON);
        assert!((filter.min_longitude - 80.0).abs() < f64::EPSILON);
        assert!((filter.max_longitude - 88.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_start_date_is_rejected() {
        let request = request_from(json!({ "end_date": "2023-11-30" }));

        let error = request.to_filter().unwrap_err();

        assert_eq!(error.field, "start_date");
        assert_eq!(error.to_string(), "start_date is required");
    }

    #[test]
    fn blank_end_date_is_rejected() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "   ",
        }));

        assert_eq!(request.to_filter().unwrap_err().field, "end_date");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let request = request_from(json!({
            "start_date": "2023-13-40",
            "end_date": "2023-11-30",
        }));

        let error = request.to_filter().unwrap_err();

        assert_eq!(error.field, "start_date");
        assert!(error.message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "min_magnitude": "strong ones",
        }));

        let error = request.to_filter().unwrap_err();

        assert_eq!(error.field, "min_magnitude");
        assert!(error.message.contains("expected a number"));
    }

    #[test]
    fn boolean_bound_is_rejected() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "max_lat": true,
        }));

        assert_eq!(request.to_filter().unwrap_err().field, "max_lat");
    }

    #[test]
    fn non_finite_string_bound_is_rejected() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "max_magnitude": "NaN",
        }));

        let error = request.to_filter().unwrap_err();

        assert_eq!(error.field, "max_magnitude");
        assert_eq!(error.message, "must be finite");
    }

    #[test]
    fn null_bound_reads_as_omitted() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "min_magnitude": null,
        }));

        let filter = request.to_filter().unwrap();

        assert!((filter.min_magnitude - QueryFilter::DEFAULT_MIN_MAGNITUDE).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_bounds_pass_through_unchanged() {
        let request = request_from(json!({
            "start_date": "2023-11-01",
            "end_date": "2023-11-30",
            "min_magnitude": 8.0,
            "max_magnitude": 1.0,
        }));

        let filter = request.to_filter().unwrap();

        assert!((filter.min_magnitude - 8.0).abs() < f64::EPSILON);
        assert!((filter.max_magnitude - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_response_uses_wire_field_names() {
        let response = ReportResponse {
            image_url: "/maps/quake_map_20231115_031500_0a1b2c3d.png".to_string(),
            table_data: Vec::new(),
            daily_counts: vec![("2023-11-15".to_string(), 2), ("Total".to_string(), 2)],
        };

        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("image_url").is_some());
        assert!(value.get("table_data").is_some());
        assert_eq!(value["daily_counts"], json!([["2023-11-15", 2], ["Total", 2]]));
    }
}
