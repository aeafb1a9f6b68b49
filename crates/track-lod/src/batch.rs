//! Multi-track reduction
//!
//! Splits a mixed stream of samples into per-source tracks, reduces the tracks in
//! parallel, and merges the results back into one time-ordered timeline. Tracks never
//! share state, so each one is an independent rayon task.

use crate::{LodConfig, LodStats, Result, Track, TrackPoint, apply_lod_with_stats};
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

/// Which tracks of a batch go through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReducePolicy {
    /// Reduce every track
    Always,
    /// Only reduce tracks longer than `max_points_per_track`; shorter ones are passed
    /// through (time-sorted) at full detail
    #[default]
    OverCapOnly,
}

/// A reduced track together with its source key and stage counts
#[derive(Debug, Clone)]
pub struct ReducedTrack<K, P = ()> {
    pub key: K,
    pub track: Track<P>,
    pub stats: LodStats,
}

/// Split `points` into one track per source key
///
/// Keys appear in order of first occurrence and every track keeps the input order of its
/// samples.
pub fn group_by_source<K, P, F>(
    points: impl IntoIterator<Item = TrackPoint<P>>,
    mut key_of: F,
) -> Vec<(K, Track<P>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&TrackPoint<P>) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<TrackPoint<P>>)> = Vec::new();

    for point in points {
        let key = key_of(&point);
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(point);
    }

    groups
        .into_iter()
        .map(|(key, points)| (key, Track::new(points)))
        .collect()
}

/// Reduce many tracks in parallel
///
/// Output order matches input order. The configuration is validated once up front.
pub fn reduce_tracks<K, P>(
    tracks: Vec<(K, Track<P>)>,
    config: &LodConfig,
    policy: ReducePolicy,
) -> Result<Vec<ReducedTrack<K, P>>>
where
    K: Send,
    P: Clone + Send + Sync,
{
    #[cfg(feature = "profiling")]
    profiling::scope!("batch::reduce_tracks");

    config.validate()?;

    let reduced: Vec<ReducedTrack<K, P>> = tracks
        .into_par_iter()
        .map(|(key, track)| {
            let needs_reduction = match policy {
                ReducePolicy::Always => true,
                ReducePolicy::OverCapOnly => track.len() > config.max_points_per_track,
            };

            if needs_reduction {
                let (track, stats) = apply_lod_with_stats(&track, config)?;
                Ok(ReducedTrack { key, track, stats })
            } else {
                Ok(pass_through(key, track))
            }
        })
        .collect::<Result<_>>()?;

    let input: usize = reduced.iter().map(|r| r.stats.input).sum();
    let output: usize = reduced.iter().map(|r| r.stats.output).sum();
    tracing::debug!(tracks = reduced.len(), input, output, "Reduced track batch");

    Ok(reduced)
}

fn pass_through<K, P>(key: K, track: Track<P>) -> ReducedTrack<K, P> {
    let mut points = track.into_points();
    points.sort_by_key(|p| p.timestamp);
    let len = points.len();

    ReducedTrack {
        key,
        track: Track::new(points),
        stats: LodStats {
            input: len,
            after_decimation: len,
            after_simplification: len,
            output: len,
            cap_dropped_last: false,
        },
    }
}

/// Flatten reduced tracks into one timeline ordered by timestamp
///
/// Samples with equal timestamps keep the order of their tracks in `tracks`.
pub fn merge_timeline<K, P>(
    tracks: impl IntoIterator<Item = ReducedTrack<K, P>>,
) -> Vec<(K, TrackPoint<P>)>
where
    K: Clone,
{
    let mut merged: Vec<(K, TrackPoint<P>)> = tracks
        .into_iter()
        .flat_map(|reduced| {
            let key = reduced.key;
            reduced
                .track
                .into_iter()
                .map(move |point| (key.clone(), point))
        })
        .collect();

    merged.sort_by_key(|(_, point)| point.timestamp);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LodError;
    use time::{Duration, OffsetDateTime};

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    /// Samples from `sources` devices, interleaved one per second
    fn create_mixed_points(sources: u32, per_source: usize) -> Vec<TrackPoint<u32>> {
        let mut points = Vec::new();
        for i in 0..per_source {
            for source in 0..sources {
                let lat = 40.0 + source as f64 * 0.5 + i as f64 * 1e-5;
                let lon = -3.0 + (i as f64 * 0.01).sin() * 0.002;
                points.push(TrackPoint::with_payload(at(i as i64), lat, lon, source));
            }
        }
        points
    }

    #[test]
    fn test_group_by_source_preserves_order() {
        let points = vec![
            TrackPoint::with_payload(at(3), 0.0, 0.0, "b"),
            TrackPoint::with_payload(at(1), 0.0, 0.0, "a"),
            TrackPoint::with_payload(at(2), 0.0, 0.0, "b"),
            TrackPoint::with_payload(at(0), 0.0, 0.0, "a"),
        ];

        let groups = group_by_source(points, |p| p.payload);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[1].0, "a");

        let b_times: Vec<_> = groups[0].1.iter().map(|p| p.timestamp).collect();
        assert_eq!(b_times, vec![at(3), at(2)]);
    }

    #[test]
    fn test_group_by_source_empty() {
        let groups = group_by_source(Vec::<TrackPoint<u8>>::new(), |p| p.payload);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_over_cap_only_skips_short_tracks() {
        let mut tracks = group_by_source(create_mixed_points(2, 100), |p| p.payload);
        let long: Track<u32> = (0..5_000)
            .map(|i| TrackPoint::with_payload(at(i), 10.0, i as f64 * 1e-4, 9))
            .collect();
        tracks.push((9, long));
        let config = LodConfig::default().with_max_points(1_000);

        let reduced = reduce_tracks(tracks, &config, ReducePolicy::OverCapOnly).unwrap();

        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[0].key, 0);
        assert_eq!(reduced[0].track.len(), 100);
        assert_eq!(reduced[1].track.len(), 100);
        assert_eq!(reduced[2].key, 9);
        assert!(reduced[2].track.len() <= 1_000);
        assert_eq!(reduced[2].stats.input, 5_000);
    }

    #[test]
    fn test_always_reduces_every_track() {
        let tracks = group_by_source(create_mixed_points(3, 600), |p| p.payload);
        let config = LodConfig::new(10_000, 0.0, 5.0, true).unwrap();

        let reduced = reduce_tracks(tracks, &config, ReducePolicy::Always).unwrap();
        assert_eq!(reduced.len(), 3);
        for r in &reduced {
            assert_eq!(r.stats.input, 600);
            assert!(r.track.len() < 600);
            assert!(r.track.is_time_sorted());
        }
    }

    #[test]
    fn test_pass_through_sorts() {
        let points = vec![
            TrackPoint::new(at(5), 0.0, 0.0),
            TrackPoint::new(at(1), 0.0, 0.0),
        ];
        let reduced = reduce_tracks(
            vec![("x", Track::new(points))],
            &LodConfig::default(),
            ReducePolicy::OverCapOnly,
        )
        .unwrap();
        assert!(reduced[0].track.is_time_sorted());
        assert_eq!(reduced[0].stats.output, 2);
    }

    #[test]
    fn test_invalid_config_rejected_for_batch() {
        let tracks = vec![(1, Track::new(vec![TrackPoint::new(at(0), 0.0, 0.0)]))];
        let config = LodConfig::default().with_epsilon_meters(-1.0);
        assert!(matches!(
            reduce_tracks(tracks, &config, ReducePolicy::Always),
            Err(LodError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_merge_timeline_orders_by_time() {
        let tracks = group_by_source(create_mixed_points(2, 50), |p| p.payload);
        let reduced =
            reduce_tracks(tracks, &LodConfig::default(), ReducePolicy::OverCapOnly).unwrap();

        let merged = merge_timeline(reduced);
        assert_eq!(merged.len(), 100);
        assert!(merged.windows(2).all(|w| w[0].1.timestamp <= w[1].1.timestamp));
        // Equal timestamps keep track order.
        assert_eq!(merged[0].0, 0);
        assert_eq!(merged[1].0, 1);
    }
}
