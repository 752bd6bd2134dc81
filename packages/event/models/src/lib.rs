#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Normalized seismic event types and magnitude tier definitions.
//!
//! This crate defines the canonical post-normalization event shape used
//! across the entire quake-map system, plus the four-band magnitude
//! taxonomy that drives marker styling on the rendered map.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Magnitude band for a seismic event.
///
/// Band edges are upper-inclusive: a magnitude of exactly 4.40 is
/// [`Light`](Self::Light), exactly 5.00 is [`Strong`](Self::Strong), and
/// only strictly-greater-than 5.00 is [`Severe`](Self::Severe).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MagnitudeTier {
    /// Magnitude 4.40 and below
    Light,
    /// Magnitude 4.41 through 4.60
    Moderate,
    /// Magnitude 4.61 through 5.00
    Strong,
    /// Magnitude above 5.00; these events get distance annotations
    Severe,
}

impl MagnitudeTier {
    /// Upper magnitude bound (inclusive) of the [`Light`](Self::Light) band.
    pub const LIGHT_MAX: f64 = 4.40;
    /// Upper magnitude bound (inclusive) of the [`Moderate`](Self::Moderate) band.
    pub const MODERATE_MAX: f64 = 4.60;
    /// Upper magnitude bound (inclusive) of the [`Strong`](Self::Strong) band.
    pub const STRONG_MAX: f64 = 5.00;

    /// Classifies a magnitude into its band.
    ///
    /// Total over all finite inputs; NaN falls through to
    /// [`Severe`](Self::Severe) but never reaches this function from
    /// normalized data.
    #[must_use]
    pub const fn classify(magnitude: f64) -> Self {
        if magnitude <= Self::LIGHT_MAX {
            Self::Light
        } else if magnitude <= Self::MODERATE_MAX {
            Self::Moderate
        } else if magnitude <= Self::STRONG_MAX {
            Self::Strong
        } else {
            Self::Severe
        }
    }

    /// Marker fill color as an `(r, g, b)` triple.
    #[must_use]
    pub const fn color(self) -> (u8, u8, u8) {
        match self {
            Self::Light => (34, 139, 34),
            Self::Moderate => (255, 140, 0),
            Self::Strong => (255, 69, 0),
            Self::Severe => (178, 34, 34),
        }
    }

    /// Marker radius in pixels; strictly increases with the tier.
    #[must_use]
    pub const fn marker_radius(self) -> u32 {
        match self {
            Self::Light => 4,
            Self::Moderate => 6,
            Self::Strong => 8,
            Self::Severe => 11,
        }
    }

    /// Legend label for this band.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "M <= 4.40",
            Self::Moderate => "M 4.41 - 4.60",
            Self::Strong => "M 4.61 - 5.00",
            Self::Severe => "M > 5.00",
        }
    }

    /// Whether events in this band are annotated with their distance from
    /// the region's reference point.
    #[must_use]
    pub const fn annotates_distance(self) -> bool {
        matches!(self, Self::Severe)
    }

    /// Returns all variants of this enum, lightest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Light, Self::Moderate, Self::Strong, Self::Severe]
    }
}

/// Rounds a value to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds a value to 4 decimal places.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A seismic event after normalization.
///
/// Produced once per usable catalog record and never mutated afterwards:
/// the renderer, the aggregator, and the API response all read the same
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Origin time in the region's local offset.
    pub time: DateTime<FixedOffset>,
    /// Human-readable locality description.
    pub place: String,
    /// Magnitude as reported by the catalog.
    pub magnitude: f64,
    /// Hypocenter depth in kilometers, rounded to 2 decimal places.
    pub depth_km: f64,
    /// Epicenter latitude in degrees, rounded to 4 decimal places.
    pub latitude: f64,
    /// Epicenter longitude in degrees, rounded to 4 decimal places.
    pub longitude: f64,
}

impl NormalizedEvent {
    /// Builds an event, applying the canonical rounding to depth (2 dp)
    /// and coordinates (4 dp).
    #[must_use]
    pub fn new(
        time: DateTime<FixedOffset>,
        place: impl Into<String>,
        magnitude: f64,
        depth_km: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            time,
            place: place.into(),
            magnitude,
            depth_km: round2(depth_km),
            latitude: round4(latitude),
            longitude: round4(longitude),
        }
    }

    /// The magnitude band this event falls into.
    #[must_use]
    pub const fn tier(&self) -> MagnitudeTier {
        MagnitudeTier::classify(self.magnitude)
    }

    /// Local calendar date of the origin time, for per-day grouping.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}
