//! Geometric simplification with Ramer–Douglas–Peucker
//!
//! The RDP scan runs on an explicit work stack rather than recursion, so a single huge
//! segment cannot exhaust the call stack. Distances are measured on the (lon, lat) plane,
//! see [`Projection`] for how the meter tolerance maps onto it.

use crate::{Projection, Sample};
use geo::Coord;

/// Flat conversion between degrees and meters (1 degree of latitude is about 111 km)
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Simplify `track`, keeping every sample whose removal would move the path by more than
/// `epsilon_meters`
///
/// The first and last samples are always kept and relative order is preserved.
pub fn simplify<S: Sample>(track: Vec<S>, epsilon_meters: f64, projection: Projection) -> Vec<S> {
    #[cfg(feature = "profiling")]
    profiling::scope!("simplify::simplify");

    let (coords, epsilon) = project(&track, epsilon_meters, projection);
    let keep = rdp_keep_mask(&coords, epsilon);

    track
        .into_iter()
        .zip(keep)
        .filter_map(|(sample, keep)| keep.then_some(sample))
        .collect()
}

/// Compute the RDP keep-mask of a polyline
///
/// `epsilon` is in the same units as `coords`. Polylines with fewer than 3 vertices are
/// kept whole. When several interior vertices share the maximum distance, the one with
/// the lowest index is split on.
pub fn rdp_keep_mask(coords: &[Coord<f64>], epsilon: f64) -> Vec<bool> {
    let n = coords.len();
    if n < 3 {
        return vec![true; n];
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0, n - 1)];
    while let Some((i, j)) = stack.pop() {
        if j - i < 2 {
            continue;
        }

        let start = coords[i];
        let end = coords[j];
        let mut max_distance = -1.0;
        let mut max_index = i;

        for (k, &point) in coords.iter().enumerate().take(j).skip(i + 1) {
            let distance = distance_to_chord(point, start, end);
            if distance > max_distance {
                max_distance = distance;
                max_index = k;
            }
        }

        if max_distance > epsilon {
            keep[max_index] = true;
            stack.push((i, max_index));
            stack.push((max_index, j));
        }
    }

    keep
}

/// Distance from `point` to the segment `start..end`
///
/// The projection parameter is clamped to the segment, and a degenerate segment falls
/// back to the plain distance from `start`.
#[inline]
fn distance_to_chord(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let chord = end - start;
    let offset = point - start;
    let length_sq = chord.x * chord.x + chord.y * chord.y;

    if length_sq == 0.0 {
        return offset.x.hypot(offset.y);
    }

    let t = ((offset.x * chord.x + offset.y * chord.y) / length_sq).clamp(0.0, 1.0);
    let nearest = start + chord * t;
    (point.x - nearest.x).hypot(point.y - nearest.y)
}

/// Map samples to the plane the tolerance is measured on
///
/// Returns the planar coordinates and the tolerance in the same units.
fn project<S: Sample>(
    track: &[S],
    epsilon_meters: f64,
    projection: Projection,
) -> (Vec<Coord<f64>>, f64) {
    match projection {
        Projection::DegreeScale => {
            let coords = track.iter().map(Sample::coord).collect();
            (coords, epsilon_meters / METERS_PER_DEGREE)
        }
        Projection::Equirectangular => {
            let lon_scale = mean_latitude(track).to_radians().cos() * METERS_PER_DEGREE;
            let coords = track
                .iter()
                .map(|s| {
                    let c = s.coord();
                    Coord {
                        x: c.x * lon_scale,
                        y: c.y * METERS_PER_DEGREE,
                    }
                })
                .collect();
            (coords, epsilon_meters)
        }
    }
}

fn mean_latitude<S: Sample>(track: &[S]) -> f64 {
    if track.is_empty() {
        return 0.0;
    }
    track.iter().map(|s| s.coord().y).sum::<f64>() / track.len() as f64
}
