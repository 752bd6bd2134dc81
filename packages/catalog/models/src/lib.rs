#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Catalog query filter types.
//!
//! [`QueryFilter`] is the validated, fully-populated form of a report
//! request: every field has a concrete value by the time it reaches the
//! catalog client, with omitted bounds filled from the documented
//! defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fully-resolved catalog query window.
///
/// The filter is forwarded to the catalog as-is; inverted windows
/// (`min > max`) are the catalog's to reject or answer emptily.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// First day of the query window.
    pub start_date: NaiveDate,
    /// Last day of the query window, forwarded to the catalog as-is.
    pub end_date: NaiveDate,
    /// Minimum magnitude.
    pub min_magnitude: f64,
    /// Maximum magnitude.
    pub max_magnitude: f64,
    /// Southern latitude boundary in degrees.
    pub min_latitude: f64,
    /// Northern latitude boundary in degrees.
    pub max_latitude: f64,
    /// Western longitude boundary in degrees.
    pub min_longitude: f64,
    /// Eastern longitude boundary in degrees.
    pub max_longitude: f64,
}

impl QueryFilter {
    /// Default minimum magnitude when a request omits it.
    pub const DEFAULT_MIN_MAGNITUDE: f64 = 0.0;
    /// Default maximum magnitude when a request omits it.
    pub const DEFAULT_MAX_MAGNITUDE: f64 = 10.0;
    /// Default southern latitude boundary (whole globe).
    pub const DEFAULT_MIN_LATITUDE: f64 = -90.0;
    /// Default northern latitude boundary (whole globe).
    pub const DEFAULT_MAX_LATITUDE: f64 = 90.0;
    /// Default western longitude boundary (whole globe).
    pub const DEFAULT_MIN_LONGITUDE: f64 = -180.0;
    /// Default eastern longitude boundary (whole globe).
    pub const DEFAULT_MAX_LONGITUDE: f64 = 180.0;

    /// Creates a filter for the given date window with every other bound
    /// at its documented default.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            min_magnitude: Self::DEFAULT_MIN_MAGNITUDE,
            max_magnitude: Self::DEFAULT_MAX_MAGNITUDE,
            min_latitude: Self::DEFAULT_MIN_LATITUDE,
            max_latitude: Self::DEFAULT_MAX_LATITUDE,
            min_longitude: Self::DEFAULT_MIN_LONGITUDE,
            max_longitude: Self::DEFAULT_MAX_LONGITUDE,
        }
    }
}
