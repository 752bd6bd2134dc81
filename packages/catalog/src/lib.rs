#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! USGS FDSN event catalog client and record normalization.
//!
//! Fetches earthquake records from the USGS event service as `GeoJSON` and
//! turns the usable ones into [`NormalizedEvent`]s. Partial records are a
//! normal part of the feed and are skipped, never treated as failures.
//!
//! Service docs: <https://earthquake.usgs.gov/fdsnws/event/1/>

pub mod normalize;

use std::time::Duration;

use geojson::{FeatureCollection, GeoJson};
use quake_map_catalog_models::QueryFilter;
use quake_map_event_models::NormalizedEvent;

pub use normalize::normalize_events;

/// Production USGS FDSN event query endpoint.
pub const USGS_QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Per-request timeout for catalog queries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from fetching or decoding a catalog response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed or the catalog answered with a non-2xx status.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid `GeoJSON`.
    #[error("catalog payload was not valid GeoJSON: {0}")]
    Payload(#[from] geojson::Error),

    /// Response body was valid `GeoJSON` but not a feature collection.
    #[error("catalog payload was not a feature collection")]
    Collection,
}

/// Client for the USGS FDSN event service.
///
/// Holds one shared [`reqwest::Client`]; the endpoint is overridable for
/// tests and mirrors.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Creates a client pointed at the production USGS endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(USGS_QUERY_URL)
    }

    /// Creates a client pointed at an alternate query endpoint.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Runs one catalog query for the given window and decodes the result.
    ///
    /// No retries: the caller decides whether a failed report is worth
    /// re-requesting.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails, the catalog answers
    /// with a non-2xx status, or the body is not a `GeoJSON` feature
    /// collection.
    pub async fn fetch(&self, filter: &QueryFilter) -> Result<FeatureCollection, FetchError> {
        let url = build_query_url(&self.base_url, filter);
        log::info!(
            "Querying catalog for {start}..{end}",
            start = filter.start_date,
            end = filter.end_date
        );

        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let collection = parse_collection(&body)?;
        log::info!("Catalog returned {} records", collection.features.len());
        Ok(collection)
    }

    /// Fetches and normalizes in one step.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] under the same conditions as [`Self::fetch`].
    /// An empty result is not an error.
    pub async fn fetch_events(
        &self,
        filter: &QueryFilter,
        offset: chrono::FixedOffset,
    ) -> Result<Vec<NormalizedEvent>, FetchError> {
        let collection = self.fetch(filter).await?;
        Ok(normalize_events(&collection, offset))
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the FDSN query URL for a filter.
///
/// Dates render as `YYYY-MM-DD` and every bound is forwarded exactly as
/// the filter carries it; window semantics are the service's.
fn build_query_url(base_url: &str, filter: &QueryFilter) -> String {
    format!(
        "{base_url}?format=geojson\
         &starttime={start}\
         &endtime={end}\
         &minmagnitude={min_mag}\
         &maxmagnitude={max_mag}\
         &minlatitude={min_lat}\
         &maxlatitude={max_lat}\
         &minlongitude={min_lon}\
         &maxlongitude={max_lon}",
        start = filter.start_date,
        end = filter.end_date,
        min_mag = filter.min_magnitude,
        max_mag = filter.max_magnitude,
        min_lat = filter.min_latitude,
        max_lat = filter.max_latitude,
        min_lon = filter.min_longitude,
        max_lon = filter.max_longitude,
    )
}

/// Decodes a response body into a feature collection.
fn parse_collection(body: &str) -> Result<FeatureCollection, FetchError> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(FetchError::Collection),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn january_filter() -> QueryFilter {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        QueryFilter::new(start, end)
    }

    #[test]
    fn query_url_includes_every_window_parameter() {
        let mut filter = january_filter();
        filter.min_magnitude = 4.5;
        filter.max_magnitude = 7.25;
        filter.min_latitude = 26.0;
        filter.max_latitude = 31.0;
        filter.min_longitude = 80.0;
        filter.max_longitude = 88.5;

        let url = build_query_url(USGS_QUERY_URL, &filter);

        assert!(url.starts_with("https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson"));
        assert!(url.contains("&starttime=2023-01-01"));
        assert!(url.contains("&endtime=2023-01-31"));
        assert!(url.contains("&minmagnitude=4.5"));
        assert!(url.contains("&maxmagnitude=7.25"));
        assert!(url.contains("&minlatitude=26"));
        assert!(url.contains("&maxlatitude=31"));
        assert!(url.contains("&minlongitude=80"));
        assert!(url.contains("&maxlongitude=88.5"));
    }

    #[test]
    fn query_url_renders_defaults_for_unset_bounds() {
        let url = build_query_url("http://localhost/query", &january_filter());
        assert!(url.contains("&minmagnitude=0"));
        assert!(url.contains("&maxmagnitude=10"));
        assert!(url.contains("&minlatitude=-90"));
        assert!(url.contains("&maxlongitude=180"));
    }

    #[test]
    fn parses_feature_collection_body() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": []
        })
        .to_string();
        let collection = parse_collection(&body).unwrap();
        assert!(collection.features.is_empty());
    }

    #[test]
    fn rejects_non_collection_geojson() {
        let body = serde_json::json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [85.0, 27.0, 10.0] }
        })
        .to_string();
        assert!(matches!(
            parse_collection(&body),
            Err(FetchError::Collection)
        ));
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(matches!(
            parse_collection("<html>service unavailable</html>"),
            Err(FetchError::Payload(_))
        ));
    }
}
