//! Track storage module
//!
//! This module provides the `TrackPoint` and `Track` types that carry time-stamped
//! positions plus an opaque payload, and the `Sample` trait the reduction stages read.

use crate::{LodError, Result};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Read access to the fields the reduction stages inspect.
///
/// Implemented for [`TrackPoint`] and for any reference to a `Sample`, so the pipeline can
/// shuffle borrowed samples around and only clone payloads for the survivors.
pub trait Sample {
    /// Absolute time of the sample
    fn timestamp(&self) -> OffsetDateTime;

    /// Planar position with `x = lon` and `y = lat`, in degrees
    fn coord(&self) -> Coord<f64>;
}

impl<S: Sample + ?Sized> Sample for &S {
    #[inline]
    fn timestamp(&self) -> OffsetDateTime {
        (**self).timestamp()
    }

    #[inline]
    fn coord(&self) -> Coord<f64> {
        (**self).coord()
    }
}

/// A single GPS sample
///
/// The `payload` holds every attribute the engine does not read (altitude, speed, the
/// original GPX waypoint, a row id, ...). It travels with the sample untouched.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPoint<P = ()> {
    /// Absolute time of the fix
    pub timestamp: OffsetDateTime,
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
    /// Passthrough attributes
    pub payload: P,
}

impl TrackPoint {
    /// Create a sample without passthrough attributes
    pub fn new(timestamp: OffsetDateTime, lat: f64, lon: f64) -> Self {
        Self::with_payload(timestamp, lat, lon, ())
    }
}

impl<P> TrackPoint<P> {
    /// Create a sample carrying `payload`
    pub fn with_payload(timestamp: OffsetDateTime, lat: f64, lon: f64, payload: P) -> Self {
        Self {
            timestamp,
            lat,
            lon,
            payload,
        }
    }
}

impl<P> Sample for TrackPoint<P> {
    #[inline]
    fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    #[inline]
    fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// An owned, contiguous sequence of samples
///
/// Input tracks may be in any order; tracks produced by the engine are always sorted
/// ascending by timestamp.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track<P = ()> {
    points: Vec<TrackPoint<P>>,
}

impl<P> Default for Track<P> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<P> Track<P> {
    /// Wrap a vector of samples
    pub fn new(points: Vec<TrackPoint<P>>) -> Self {
        Self { points }
    }

    /// All samples, in stored order
    #[inline]
    pub fn points(&self) -> &[TrackPoint<P>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackPoint<P>> {
        self.points.iter()
    }

    /// Consume the track and return its samples
    pub fn into_points(self) -> Vec<TrackPoint<P>> {
        self.points
    }

    /// Check whether timestamps are non-decreasing
    pub fn is_time_sorted(&self) -> bool {
        self.points.is_sorted_by_key(|p| p.timestamp)
    }
}

impl Track<gpx::Waypoint> {
    /// Build a track from an already parsed GPX segment
    ///
    /// Each waypoint becomes the payload of its sample. Every waypoint must carry a time.
    pub fn from_gpx_segment(segment: &gpx::TrackSegment) -> Result<Self> {
        segment
            .points
            .iter()
            .enumerate()
            .map(|(index, waypoint)| {
                let timestamp = waypoint
                    .time
                    .map(OffsetDateTime::from)
                    .ok_or(LodError::MissingTimestamp { index })?;
                let point = waypoint.point();
                Ok(TrackPoint::with_payload(
                    timestamp,
                    point.y(),
                    point.x(),
                    waypoint.clone(),
                ))
            })
            .collect()
    }

    /// Turn the track back into a GPX segment, one waypoint per sample
    pub fn into_gpx_segment(self) -> gpx::TrackSegment {
        let mut segment = gpx::TrackSegment::default();
        segment.points = self.points.into_iter().map(|p| p.payload).collect();
        segment
    }
}

impl<P> FromIterator<TrackPoint<P>> for Track<P> {
    fn from_iter<I: IntoIterator<Item = TrackPoint<P>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<P> IntoIterator for Track<P> {
    type Item = TrackPoint<P>;
    type IntoIter = std::vec::IntoIter<TrackPoint<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, P> IntoIterator for &'a Track<P> {
    type Item = &'a TrackPoint<P>;
    type IntoIter = std::slice::Iter<'a, TrackPoint<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{TrackSegment, Waypoint};
    use time::Duration;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    fn create_test_waypoint(lat: f64, lon: f64, seconds: i64) -> Waypoint {
        let mut waypoint = Waypoint::new(geo::Point::new(lon, lat));
        waypoint.time = Some(gpx::Time::from(at(seconds)));
        waypoint.elevation = Some(100.0 + seconds as f64);
        waypoint
    }

    #[test]
    fn test_sample_coord_is_lon_lat() {
        let point = TrackPoint::new(at(0), 51.5074, -0.1278);
        let coord = point.coord();
        assert_eq!(coord.x, -0.1278);
        assert_eq!(coord.y, 51.5074);
        assert_eq!(point.timestamp(), at(0));
    }

    #[test]
    fn test_sample_through_reference() {
        let point = TrackPoint::with_payload(at(5), 1.0, 2.0, "row-7");
        let by_ref: &TrackPoint<&str> = &point;
        assert_eq!(Sample::timestamp(&by_ref), at(5));
        assert_eq!(Sample::coord(&by_ref), Coord { x: 2.0, y: 1.0 });
    }

    #[test]
    fn test_track_accessors() {
        let track: Track = (0..5).map(|i| TrackPoint::new(at(i), 0.0, 0.0)).collect();
        assert_eq!(track.len(), 5);
        assert!(!track.is_empty());
        assert_eq!(track.iter().count(), 5);
        assert!(track.is_time_sorted());
        assert!(Track::<()>::default().is_empty());
    }

    #[test]
    fn test_is_time_sorted_detects_disorder() {
        let track = Track::new(vec![
            TrackPoint::new(at(10), 0.0, 0.0),
            TrackPoint::new(at(5), 0.0, 0.0),
        ]);
        assert!(!track.is_time_sorted());

        let equal = Track::new(vec![
            TrackPoint::new(at(5), 0.0, 0.0),
            TrackPoint::new(at(5), 1.0, 1.0),
        ]);
        assert!(equal.is_time_sorted());
    }

    #[test]
    fn test_from_gpx_segment() {
        let mut segment = TrackSegment::default();
        for i in 0..3 {
            segment.points.push(create_test_waypoint(
                51.5074 + i as f64 * 0.0001,
                -0.1278,
                i,
            ));
        }

        let track = Track::from_gpx_segment(&segment).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.points()[2].timestamp, at(2));
        assert!((track.points()[2].lat - 51.5076).abs() < 1e-9);
        assert_eq!(track.points()[1].payload.elevation, Some(101.0));
    }

    #[test]
    fn test_from_gpx_segment_missing_time() {
        let mut segment = TrackSegment::default();
        segment.points.push(create_test_waypoint(51.0, 0.0, 0));
        segment
            .points
            .push(Waypoint::new(geo::Point::new(0.0, 51.0)));

        let result = Track::from_gpx_segment(&segment);
        assert!(matches!(
            result,
            Err(LodError::MissingTimestamp { index: 1 })
        ));
    }

    #[test]
    fn test_into_gpx_segment_keeps_waypoints() {
        let mut segment = TrackSegment::default();
        for i in 0..4 {
            segment.points.push(create_test_waypoint(10.0, 20.0 + i as f64, i));
        }

        let track = Track::from_gpx_segment(&segment).unwrap();
        let back = track.into_gpx_segment();
        assert_eq!(back.points.len(), 4);
        assert_eq!(back.points[3].elevation, Some(103.0));
        assert!((back.points[3].point().x() - 23.0).abs() < 1e-9);
    }
}
