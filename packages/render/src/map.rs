//! The map drawing pipeline.
//!
//! One call renders one complete image: backdrop, tiered event markers,
//! distance annotations for severe events, reference marker, legend, and
//! the frequency panel. Everything is computed from the arguments, so
//! identical inputs produce identical bytes.

use std::path::Path;

use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use quake_map_analytics::FrequencyTable;
use quake_map_event_models::{MagnitudeTier, NormalizedEvent};

use crate::RenderError;
use crate::backend::{GuardedBackend, ensure_fonts};
use crate::geometry::{dash_segments, great_circle_km};
use crate::region::RegionProfile;

/// Output image width in pixels.
pub const MAP_WIDTH: u32 = 1200;
/// Output image height in pixels.
pub const MAP_HEIGHT: u32 = 900;

/// Dashes per distance annotation line.
const ANNOTATION_DASHES: u32 = 24;

/// Date rows the frequency panel shows before eliding the middle.
const MAX_TABLE_DATE_ROWS: usize = 14;

const WATERWAY_COLOR: RGBColor = RGBColor(70, 130, 180);

type MapChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Renders the full map image for the given events and table.
///
/// The target file is written in place; when drawing fails partway the
/// file may exist with partial content, which is why report generation
/// goes through [`crate::render_report`] and its temp-file scheme rather
/// than calling this directly.
///
/// # Errors
///
/// Returns [`RenderError`] if any drawing step or the final bitmap
/// encode fails.
pub fn render_map(
    profile: &RegionProfile,
    events: &[NormalizedEvent],
    table: &FrequencyTable,
    path: &Path,
) -> Result<(), RenderError> {
    ensure_fonts();

    let backend = BitMapBackend::new(path, (MAP_WIDTH, MAP_HEIGHT));
    let root = GuardedBackend::new(backend).into_drawing_area();
    draw_map(&root, profile, events, table)?;
    root.present().map_err(RenderError::backend)?;

    log::info!("Rendered {} events onto {}", events.len(), path.display());
    Ok(())
}

fn draw_map<DB>(
    root: &DrawingArea<DB, Shift>,
    profile: &RegionProfile,
    events: &[NormalizedEvent],
    table: &FrequencyTable,
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(RenderError::backend)?;

    let viewport = &profile.viewport;
    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("Earthquake activity - {}", profile.name),
            FontDesc::new(FontFamily::SansSerif, 26.0, FontStyle::Normal),
        )
        .margin(18)
        .set_label_area_size(LabelAreaPosition::Left, 55)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(
            viewport.min_longitude..viewport.max_longitude,
            viewport.min_latitude..viewport.max_latitude,
        )
        .map_err(RenderError::backend)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_formatter(&|value| format!("{value:.1}"))
        .y_label_formatter(&|value| format!("{value:.1}"))
        .bold_line_style(BLACK.mix(0.12))
        .light_line_style(BLACK.mix(0.05))
        .label_style(FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Normal))
        .draw()
        .map_err(RenderError::backend)?;

    draw_backdrop(&mut chart, profile)?;
    draw_distance_annotations(&mut chart, profile, events)?;
    draw_events(&mut chart, events)?;
    draw_reference_marker(&mut chart, profile)?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .label_font(FontDesc::new(FontFamily::SansSerif, 15.0, FontStyle::Normal))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(RenderError::backend)?;

    draw_frequency_panel(root, table)?;

    Ok(())
}

/// Region outline and waterways, drawn first so markers sit on top.
fn draw_backdrop<DB>(
    chart: &mut MapChart<'_, DB>,
    profile: &RegionProfile,
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if profile.outline.len() > 1 {
        chart
            .draw_series(std::iter::once(PathElement::new(
                profile.outline.clone(),
                BLACK.mix(0.4).stroke_width(2),
            )))
            .map_err(RenderError::backend)?;
    }

    let stroke = WATERWAY_COLOR.mix(0.65).stroke_width(2);
    let label_font =
        FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Italic).color(&WATERWAY_COLOR);
    for waterway in &profile.waterways {
        if waterway.path.len() > 1 {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    waterway.path.clone(),
                    stroke,
                )))
                .map_err(RenderError::backend)?;
        }
        if let Some(anchor) = polyline_midpoint(&waterway.path) {
            chart
                .draw_series(std::iter::once(Text::new(
                    waterway.name.clone(),
                    anchor,
                    label_font.clone(),
                )))
                .map_err(RenderError::backend)?;
        }
    }

    Ok(())
}

fn polyline_midpoint(path: &[(f64, f64)]) -> Option<(f64, f64)> {
    path.get(path.len() / 2).copied()
}

/// Event markers, one series per tier so the legend lists every band.
fn draw_events<DB>(
    chart: &mut MapChart<'_, DB>,
    events: &[NormalizedEvent],
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    for tier in MagnitudeTier::all() {
        let (r, g, b) = tier.color();
        let color = RGBColor(r, g, b);
        let radius = tier.marker_radius();

        chart
            .draw_series(
                events
                    .iter()
                    .filter(|event| event.tier() == *tier)
                    .map(|event| {
                        Circle::new(
                            (event.longitude, event.latitude),
                            radius,
                            color.stroke_width(2),
                        )
                    }),
            )
            .map_err(RenderError::backend)?
            .label(tier.label())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.stroke_width(2)));
    }

    Ok(())
}

/// A dashed line plus `"{km} km"` label for one severe event.
struct DistanceAnnotation {
    from: (f64, f64),
    to: (f64, f64),
    label: String,
    label_at: (f64, f64),
}

/// Computes the annotation set: one entry per event whose tier calls for
/// a distance, measured from the profile's reference point.
fn distance_annotations(
    profile: &RegionProfile,
    events: &[NormalizedEvent],
) -> Vec<DistanceAnnotation> {
    let reference = &profile.reference;
    let from = (reference.longitude, reference.latitude);

    events
        .iter()
        .filter(|event| event.tier().annotates_distance())
        .map(|event| {
            let km = great_circle_km(
                (reference.latitude, reference.longitude),
                (event.latitude, event.longitude),
            );
            let to = (event.longitude, event.latitude);
            let label_at = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0 + 0.06);
            DistanceAnnotation {
                from,
                to,
                label: format!("{km:.1} km"),
                label_at,
            }
        })
        .collect()
}

fn draw_distance_annotations<DB>(
    chart: &mut MapChart<'_, DB>,
    profile: &RegionProfile,
    events: &[NormalizedEvent],
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let line_style = BLACK.mix(0.55).stroke_width(1);
    let label_font = FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Normal).color(&BLACK);

    for annotation in distance_annotations(profile, events) {
        for (start, end) in dash_segments(annotation.from, annotation.to, ANNOTATION_DASHES) {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![start, end],
                    line_style,
                )))
                .map_err(RenderError::backend)?;
        }
        chart
            .draw_series(std::iter::once(Text::new(
                annotation.label.clone(),
                annotation.label_at,
                label_font.clone(),
            )))
            .map_err(RenderError::backend)?;
    }

    Ok(())
}

fn draw_reference_marker<DB>(
    chart: &mut MapChart<'_, DB>,
    profile: &RegionProfile,
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let reference = &profile.reference;
    let position = (reference.longitude, reference.latitude);

    chart
        .draw_series(std::iter::once(TriangleMarker::new(
            position,
            11,
            BLACK.filled(),
        )))
        .map_err(RenderError::backend)?
        .label(format!("{} (reference)", reference.name))
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 7, BLACK.filled()));

    chart
        .draw_series(std::iter::once(Text::new(
            reference.name.clone(),
            (position.0 + 0.08, position.1 + 0.08),
            FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Bold).color(&BLACK),
        )))
        .map_err(RenderError::backend)?;

    Ok(())
}

/// Display rows for the panel, eliding the middle when the window spans
/// more dates than fit.
fn panel_rows(table: &FrequencyTable) -> Vec<(String, Option<u64>)> {
    let display = table.display_rows();
    if display.is_empty() {
        return Vec::new();
    }
    // Total row rides along at the end of the display rows.
    if display.len() <= MAX_TABLE_DATE_ROWS + 1 {
        return display
            .into_iter()
            .map(|(label, count)| (label, Some(count)))
            .collect();
    }

    let mut rows: Vec<(String, Option<u64>)> = display[..MAX_TABLE_DATE_ROWS - 1]
        .iter()
        .cloned()
        .map(|(label, count)| (label, Some(count)))
        .collect();
    rows.push(("...".to_string(), None));
    if let Some((label, count)) = display.last() {
        rows.push((label.clone(), Some(*count)));
    }
    rows
}

/// Semi-opaque frequency table in the image's upper-left corner.
fn draw_frequency_panel<DB>(
    root: &DrawingArea<DB, Shift>,
    table: &FrequencyTable,
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let rows = panel_rows(table);
    if rows.is_empty() {
        return Ok(());
    }

    const PANEL_LEFT: i32 = 80;
    const PANEL_TOP: i32 = 72;
    const PANEL_WIDTH: i32 = 200;
    const ROW_HEIGHT: i32 = 19;
    const PADDING: i32 = 8;

    let row_count = i32::try_from(rows.len()).unwrap_or(i32::MAX);
    let height = ROW_HEIGHT * (row_count + 1) + PADDING * 2;
    let right = PANEL_LEFT + PANEL_WIDTH;
    let bottom = PANEL_TOP + height;

    root.draw(&Rectangle::new(
        [(PANEL_LEFT, PANEL_TOP), (right, bottom)],
        WHITE.mix(0.85).filled(),
    ))
    .map_err(RenderError::backend)?;
    root.draw(&Rectangle::new(
        [(PANEL_LEFT, PANEL_TOP), (right, bottom)],
        BLACK.mix(0.35).stroke_width(1),
    ))
    .map_err(RenderError::backend)?;

    let header_font = FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Bold).color(&BLACK);
    let row_font = FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Normal).color(&BLACK);

    let date_x = PANEL_LEFT + PADDING;
    let count_x = right - PADDING - 42;
    let mut y = PANEL_TOP + PADDING;

    root.draw(&Text::new("Date", (date_x, y), header_font.clone()))
        .map_err(RenderError::backend)?;
    root.draw(&Text::new("Events", (count_x, y), header_font))
        .map_err(RenderError::backend)?;
    y += ROW_HEIGHT;

    for (label, count) in rows {
        root.draw(&Text::new(label, (date_x, y), row_font.clone()))
            .map_err(RenderError::backend)?;
        if let Some(count) = count {
            root.draw(&Text::new(count.to_string(), (count_x, y), row_font.clone()))
                .map_err(RenderError::backend)?;
        }
        y += ROW_HEIGHT;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{FixedOffset, TimeZone as _, Utc};
    use quake_map_analytics::daily_frequency;

    use super::*;

    fn test_event(magnitude: f64, latitude: f64, longitude: f64, epoch_ms: i64) -> NormalizedEvent {
        let offset = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let time = Utc
            .timestamp_millis_opt(epoch_ms)
            .single()
            .unwrap()
            .with_timezone(&offset);
        NormalizedEvent::new(time, "test event", magnitude, 10.0, latitude, longitude)
    }

    fn temp_png(tag: &str) -> PathBuf {
        let name = format!("quake_map_render_{tag}_{}.png", uuid::Uuid::new_v4().simple());
        std::env::temp_dir().join(name)
    }

    fn reference_haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        let r = 6371.0088;
        let dlat = (lat2 - lat1).to_radians();
        let dlon = (lon2 - lon1).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
        2.0 * r * a.sqrt().asin()
    }

    #[test]
    fn renders_png_with_magic_bytes() {
        let profile = RegionProfile::nepal();
        let events = vec![
            test_event(4.2, 27.9, 84.9, 1_700_000_000_000),
            test_event(5.4, 28.4, 86.2, 1_700_090_000_000),
        ];
        let table = daily_frequency(&events);
        let path = temp_png("magic");

        render_map(&profile, &events, &table, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.len() > 1_000);
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn identical_inputs_render_identical_bytes() {
        let profile = RegionProfile::nepal();
        let events = vec![
            test_event(4.5, 27.5, 85.5, 1_700_000_000_000),
            test_event(5.6, 29.0, 82.0, 1_700_050_000_000),
        ];
        let table = daily_frequency(&events);
        let first_path = temp_png("repeat_a");
        let second_path = temp_png("repeat_b");

        render_map(&profile, &events, &table, &first_path).unwrap();
        render_map(&profile, &events, &table, &second_path).unwrap();

        let first = fs::read(&first_path).unwrap();
        let second = fs::read(&second_path).unwrap();
        assert_eq!(first, second);
        fs::remove_file(&first_path).ok();
        fs::remove_file(&second_path).ok();
    }

    #[test]
    fn renders_with_no_events() {
        let profile = RegionProfile::nepal();
        let table = daily_frequency(&[]);
        let path = temp_png("empty");

        render_map(&profile, &[], &table, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn annotates_only_strictly_above_five() {
        let profile = RegionProfile::nepal();

        let boundary = vec![test_event(5.0, 28.0, 86.0, 1_700_000_000_000)];
        assert!(distance_annotations(&profile, &boundary).is_empty());

        let above = vec![test_event(5.01, 28.0, 86.0, 1_700_000_000_000)];
        assert_eq!(distance_annotations(&profile, &above).len(), 1);
    }

    #[test]
    fn annotation_spans_reference_to_event() {
        let profile = RegionProfile::nepal();
        let events = vec![test_event(5.5, 28.2096, 83.9856, 1_700_000_000_000)];

        let annotations = distance_annotations(&profile, &events);
        let annotation = &annotations[0];

        assert!((annotation.from.0 - profile.reference.longitude).abs() < f64::EPSILON);
        assert!((annotation.from.1 - profile.reference.latitude).abs() < f64::EPSILON);
        assert!((annotation.to.0 - 83.9856).abs() < f64::EPSILON);
        assert!((annotation.to.1 - 28.2096).abs() < f64::EPSILON);
    }

    #[test]
    fn annotation_distance_matches_independent_formula() {
        let profile = RegionProfile::nepal();
        let events = vec![test_event(5.5, 28.2096, 83.9856, 1_700_000_000_000)];

        let annotations = distance_annotations(&profile, &events);
        let label = &annotations[0].label;

        let expected = reference_haversine_km(
            profile.reference.latitude,
            profile.reference.longitude,
            28.2096,
            83.9856,
        );
        let rendered: f64 = label.strip_suffix(" km").unwrap().parse().unwrap();
        assert!((rendered - expected).abs() < 0.2, "{label} vs {expected}");
    }

    #[test]
    fn panel_rows_pass_through_when_short() {
        let events = vec![
            test_event(4.0, 27.0, 85.0, 1_700_000_000_000),
            test_event(4.1, 27.1, 85.1, 1_700_090_000_000),
        ];
        let table = daily_frequency(&events);

        let rows = panel_rows(&table);

        assert_eq!(rows.len(), table.display_rows().len());
        assert!(rows.iter().all(|(_, count)| count.is_some()));
    }

    #[test]
    fn panel_rows_elide_long_windows() {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        let events: Vec<NormalizedEvent> = (0..30)
            .map(|day| test_event(4.0, 27.0, 85.0, 1_690_000_000_000 + day * DAY_MS))
            .collect();
        let table = daily_frequency(&events);

        let rows = panel_rows(&table);

        assert_eq!(rows.len(), MAX_TABLE_DATE_ROWS + 1);
        assert_eq!(rows[MAX_TABLE_DATE_ROWS - 1].0, "...");
        assert!(rows[MAX_TABLE_DATE_ROWS - 1].1.is_none());
        let last = rows.last().unwrap();
        assert_eq!(last.0, "Total");
        assert_eq!(last.1, Some(30));
    }
}
