//! Distance and line-segmentation helpers for map annotations.

use geo::{Distance as _, Haversine, Point};

/// Great-circle distance in kilometers between two `(latitude, longitude)`
/// coordinates.
#[must_use]
pub fn great_circle_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let origin = Point::new(from.1, from.0);
    let destination = Point::new(to.1, to.0);
    Haversine.distance(origin, destination) / 1000.0
}

/// Splits the straight line between two data-space points into evenly
/// spaced dashes, returned as `(start, end)` endpoint pairs.
///
/// Dashes and gaps alternate with equal length, starting with a dash at
/// `from`; the final gap means the line visually stops just short of `to`.
#[must_use]
pub fn dash_segments(
    from: (f64, f64),
    to: (f64, f64),
    dashes: u32,
) -> Vec<((f64, f64), (f64, f64))> {
    if dashes == 0 {
        return Vec::new();
    }

    let steps = f64::from(dashes * 2);
    let dx = (to.0 - from.0) / steps;
    let dy = (to.1 - from.1) / steps;

    (0..dashes)
        .map(|index| {
            let start_step = f64::from(index * 2);
            let start = (from.0 + dx * start_step, from.1 + dy * start_step);
            let end = (
                from.0 + dx * (start_step + 1.0),
                from.1 + dy * (start_step + 1.0),
            );
            (start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KATHMANDU: (f64, f64) = (27.7172, 85.3240);
    const POKHARA: (f64, f64) = (28.2096, 83.9856);

    #[test]
    fn zero_distance_for_same_point() {
        assert!(great_circle_km(KATHMANDU, KATHMANDU).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let km = great_circle_km((27.0, 85.0), (28.0, 85.0));
        assert!((km - 111.195).abs() < 0.5, "got {km}");
    }

    #[test]
    fn distance_is_symmetric() {
        let forward = great_circle_km(KATHMANDU, POKHARA);
        let back = great_circle_km(POKHARA, KATHMANDU);
        assert!((forward - back).abs() < 1e-9);
    }

    #[test]
    fn kathmandu_to_pokhara_is_roughly_143_km() {
        let km = great_circle_km(KATHMANDU, POKHARA);
        assert!((140.0..=146.0).contains(&km), "got {km}");
    }

    #[test]
    fn dash_count_matches_request() {
        let segments = dash_segments((0.0, 0.0), (10.0, 0.0), 25);
        assert_eq!(segments.len(), 25);
    }

    #[test]
    fn dashes_start_at_origin_and_leave_gaps() {
        let segments = dash_segments((0.0, 0.0), (10.0, 0.0), 5);

        let (first_start, first_end) = segments[0];
        assert!((first_start.0 - 0.0).abs() < 1e-12);
        assert!((first_end.0 - 1.0).abs() < 1e-12);

        // Each dash begins one full dash length after the previous ended.
        for pair in segments.windows(2) {
            let (_, previous_end) = pair[0];
            let (next_start, _) = pair[1];
            assert!(next_start.0 > previous_end.0);
        }
    }

    #[test]
    fn zero_dashes_yields_nothing() {
        assert!(dash_segments((0.0, 0.0), (1.0, 1.0), 0).is_empty());
    }
}
