#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns a batch of normalized events into a finished map image on disk.
//!
//! [`render_report`] is the entry point: it renders into a hidden temp
//! file in the output directory and renames it into place, so readers of
//! the directory only ever see complete images. [`sweep_partial_files`]
//! clears temp files left behind by a crashed process.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quake_map_analytics::FrequencyTable;
use quake_map_event_models::NormalizedEvent;
use uuid::Uuid;

pub mod backend;
pub mod geometry;
pub mod map;
pub mod region;

pub use map::{MAP_HEIGHT, MAP_WIDTH, render_map};
pub use region::{ReferencePoint, RegionError, RegionProfile, Viewport, Waterway};

/// Temp files carry this prefix until the rename that publishes them.
const PARTIAL_PREFIX: &str = ".partial-";

/// Errors from the rendering pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A drawing primitive or the final bitmap encode failed.
    #[error("drawing failed: {message}")]
    Backend {
        /// Description of the failed drawing step.
        message: String,
    },

    /// Filesystem operation while publishing the image failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub(crate) fn backend(error: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: error.to_string(),
        }
    }
}

/// A finished image, published under its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Bare file name, suitable for building a URL.
    pub file_name: String,
    /// Full path of the published image.
    pub path: PathBuf,
}

/// Builds the unique file name for one report.
///
/// Combines a second-resolution timestamp with a random id so that two
/// requests in the same second never collide.
#[must_use]
pub fn report_filename(now: DateTime<Utc>, id: Uuid) -> String {
    let id = id.simple().to_string();
    let short = &id[..8];
    format!("quake_map_{}_{short}.png", now.format("%Y%m%d_%H%M%S"))
}

/// Renders a report image into `output_dir`.
///
/// The image is drawn into a `.partial-` temp file and renamed to its
/// final name only after the encode succeeds. On failure the temp file
/// is removed, so no partial image is ever published.
///
/// # Errors
///
/// Returns [`RenderError`] if the directory cannot be created, drawing
/// fails, or the final rename fails.
pub fn render_report(
    profile: &RegionProfile,
    events: &[NormalizedEvent],
    table: &FrequencyTable,
    output_dir: &Path,
) -> Result<RenderedReport, RenderError> {
    std::fs::create_dir_all(output_dir)?;

    let file_name = report_filename(Utc::now(), Uuid::new_v4());
    let final_path = output_dir.join(&file_name);
    let partial_path = output_dir.join(format!("{PARTIAL_PREFIX}{file_name}"));

    match map::render_map(profile, events, table, &partial_path) {
        Ok(()) => {
            std::fs::rename(&partial_path, &final_path)?;
            log::info!("Published report image {file_name}");
            Ok(RenderedReport {
                file_name,
                path: final_path,
            })
        }
        Err(error) => {
            if let Err(cleanup) = std::fs::remove_file(&partial_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!(
                        "Could not remove partial image {}: {cleanup}",
                        partial_path.display()
                    );
                }
            }
            Err(error)
        }
    }
}

/// Removes temp files left behind by an interrupted render.
///
/// Returns the number of files removed. Missing or unreadable
/// directories are treated as empty.
pub fn sweep_partial_files(output_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(output_dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(PARTIAL_PREFIX) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                log::warn!("Removed stale partial image {name}");
                removed += 1;
            }
            Err(error) => {
                log::warn!("Could not remove stale partial image {name}: {error}");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{FixedOffset, TimeZone as _};
    use quake_map_analytics::daily_frequency;

    use super::*;

    fn temp_output_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quake_map_reports_{tag}_{}", Uuid::new_v4().simple()))
    }

    #[test]
    fn filename_combines_timestamp_and_id() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 6).unwrap();
        let id = Uuid::nil();

        let name = report_filename(now, id);

        assert_eq!(name, "quake_map_20240309_140506_00000000.png");
    }

    #[test]
    fn filenames_differ_for_distinct_ids() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 6).unwrap();

        let first = report_filename(now, Uuid::new_v4());
        let second = report_filename(now, Uuid::new_v4());

        assert_ne!(first, second);
        assert!(first.ends_with(".png"));
        assert!(second.ends_with(".png"));
    }

    #[test]
    fn render_report_publishes_complete_image() {
        let profile = RegionProfile::nepal();
        let offset = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let time = Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .unwrap()
            .with_timezone(&offset);
        let events = vec![NormalizedEvent::new(time, "near Kathmandu", 4.8, 12.0, 27.8, 85.4)];
        let table = daily_frequency(&events);
        let output_dir = temp_output_dir("publish");

        let report = render_report(&profile, &events, &table, &output_dir).unwrap();

        assert!(report.path.is_file());
        assert!(report.file_name.starts_with("quake_map_"));
        assert!(report.file_name.ends_with(".png"));
        let bytes = fs::read(&report.path).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        let leftovers: Vec<_> = fs::read_dir(&output_dir)
            .unwrap()
            .flatten()
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(PARTIAL_PREFIX)
            })
            .collect();
        assert!(leftovers.is_empty());

        fs::remove_dir_all(&output_dir).ok();
    }

    #[test]
    fn sweep_removes_only_partial_files() {
        let output_dir = temp_output_dir("sweep");
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join(".partial-quake_map_x.png"), b"stale").unwrap();
        fs::write(output_dir.join("quake_map_keep.png"), b"published").unwrap();

        let removed = sweep_partial_files(&output_dir);

        assert_eq!(removed, 1);
        assert!(!output_dir.join(".partial-quake_map_x.png").exists());
        assert!(output_dir.join("quake_map_keep.png").exists());

        fs::remove_dir_all(&output_dir).ok();
    }

    #[test]
    fn sweep_of_missing_directory_is_a_no_op() {
        let output_dir = temp_output_dir("missing");

        assert_eq!(sweep_partial_files(&output_dir), 0);
    }
}
