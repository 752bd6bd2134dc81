//! Region profiles.
//!
//! Everything regional about a rendered map lives here: the fixed
//! viewport, the reference point distances are measured from, the
//! simplified outline and waterway polylines drawn as the geographic
//! backdrop, and the UTC offset local times are reported in. Profiles
//! load from TOML; the compiled-in default covers the Nepal study area.

use std::path::Path;

use chrono::{FixedOffset, Offset as _, Utc};
use serde::{Deserialize, Serialize};

/// Errors from loading or validating a region profile.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// Profile file could not be read.
    #[error("failed to read region profile: {0}")]
    Io(#[from] std::io::Error),

    /// Profile file was not valid TOML.
    #[error("failed to parse region profile: {0}")]
    Parse(#[from] toml::de::Error),

    /// Profile parsed but its contents are unusable.
    #[error("invalid region profile: {message}")]
    Invalid {
        /// Description of the failed check.
        message: String,
    },
}

/// Fixed map viewport in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Western longitude boundary.
    pub min_longitude: f64,
    /// Eastern longitude boundary.
    pub max_longitude: f64,
    /// Southern latitude boundary.
    pub min_latitude: f64,
    /// Northern latitude boundary.
    pub max_latitude: f64,
}

impl Viewport {
    /// Creates a viewport from the given boundaries.
    #[must_use]
    pub const fn new(
        min_longitude: f64,
        max_longitude: f64,
        min_latitude: f64,
        max_latitude: f64,
    ) -> Self {
        Self {
            min_longitude,
            max_longitude,
            min_latitude,
            max_latitude,
        }
    }
}

/// Named coordinate from which distances to severe events are measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Label drawn next to the marker.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A labeled waterway polyline drawn as part of the backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waterway {
    /// River name, drawn near the path midpoint.
    pub name: String,
    /// Polyline as `[longitude, latitude]` pairs.
    pub path: Vec<(f64, f64)>,
}

/// A complete map region: viewport, reference point, backdrop geometry,
/// and the local UTC offset.
///
/// Field order matters for TOML output: plain values come before the
/// nested tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    /// Region name, used in the map title.
    pub name: String,
    /// Minutes east of UTC for local-time reporting.
    pub utc_offset_minutes: i32,
    /// Simplified region outline as `[longitude, latitude]` pairs.
    pub outline: Vec<(f64, f64)>,
    /// Fixed viewport the map is always drawn at.
    pub viewport: Viewport,
    /// Reference point for distance annotations.
    pub reference: ReferencePoint,
    /// Major waterways drawn and labeled on the backdrop.
    pub waterways: Vec<Waterway>,
}

impl RegionProfile {
    /// Parses and validates a profile from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the text is not valid TOML or fails a
    /// validation check.
    pub fn from_toml(text: &str) -> Result<Self, RegionError> {
        let profile: Self = toml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads, parses, and validates a profile file.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the file cannot be read, is not valid
    /// TOML, or fails a validation check.
    pub fn load(path: &Path) -> Result<Self, RegionError> {
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_toml(&text)?;
        log::info!(
            "Loaded region profile '{}' from {}",
            profile.name,
            path.display()
        );
        Ok(profile)
    }

    /// Local offset for event timestamps.
    ///
    /// Validation keeps the minutes within chrono's representable range,
    /// so the UTC fallback is unreachable in practice.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    fn validate(&self) -> Result<(), RegionError> {
        let invalid = |message: String| RegionError::Invalid { message };

        if self.name.trim().is_empty() {
            return Err(invalid("region name is empty".to_string()));
        }
        let viewport = &self.viewport;
        if viewport.min_longitude >= viewport.max_longitude {
            return Err(invalid(format!(
                "viewport longitudes are not ordered: {} >= {}",
                viewport.min_longitude, viewport.max_longitude
            )));
        }
        if viewport.min_latitude >= viewport.max_latitude {
            return Err(invalid(format!(
                "viewport latitudes are not ordered: {} >= {}",
                viewport.min_latitude, viewport.max_latitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.reference.latitude) {
            return Err(invalid(format!(
                "reference latitude {} out of range",
                self.reference.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.reference.longitude) {
            return Err(invalid(format!(
                "reference longitude {} out of range",
                self.reference.longitude
            )));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(invalid(format!(
                "utc_offset_minutes {} out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// The compiled-in Nepal study area profile.
    #[must_use]
    pub fn nepal() -> Self {
        Self {
            name: "Nepal".to_string(),
            utc_offset_minutes: 5 * 60 + 45,
            viewport: Viewport::new(80.0, 88.5, 26.0, 31.0),
            reference: ReferencePoint {
                name: "Kathmandu".to_string(),
                latitude: 27.7172,
                longitude: 85.3240,
            },
            // Simplified national boundary, west tip -> north -> east -> south.
            outline: vec![
                (80.06, 28.83),
                (80.40, 29.45),
                (81.00, 30.20),
                (81.80, 30.40),
                (82.70, 29.97),
                (83.60, 29.30),
                (84.20, 29.30),
                (84.70, 28.73),
                (85.20, 28.60),
                (85.70, 28.40),
                (86.20, 28.17),
                (86.75, 28.10),
                (87.20, 27.85),
                (88.00, 27.90),
                (88.15, 27.87),
                (88.05, 27.45),
                (88.18, 26.88),
                (88.17, 26.36),
                (87.30, 26.40),
                (86.70, 26.43),
                (86.00, 26.65),
                (85.20, 26.77),
                (84.60, 27.00),
                (84.10, 27.52),
                (83.40, 27.47),
                (82.70, 27.72),
                (82.00, 27.92),
                (81.30, 28.15),
                (80.60, 28.60),
                (80.06, 28.83),
            ],
            waterways: vec![
                Waterway {
                    name: "Koshi".to_string(),
                    path: vec![
                        (86.20, 27.95),
                        (86.45, 27.40),
                        (86.90, 26.90),
                        (87.15, 26.50),
                    ],
                },
                Waterway {
                    name: "Gandaki".to_string(),
                    path: vec![
                        (83.95, 28.80),
                        (84.20, 28.20),
                        (84.45, 27.70),
                        (84.43, 27.00),
                    ],
                },
                Waterway {
                    name: "Karnali".to_string(),
                    path: vec![
                        (81.60, 29.90),
                        (81.35, 29.30),
                        (81.20, 28.85),
                        (80.95, 28.40),
                    ],
                },
            ],
        }
    }
}
