//! Full LOD pipeline
//!
//! `decimate → simplify → cap`, run over borrowed samples so the input track is never
//! touched and each surviving payload is cloned exactly once.

use crate::{LodConfig, Result, Track, TrackPoint, cap, decimate, simplify};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tracks with this many samples or fewer skip the RDP stage
const MIN_POINTS_FOR_RDP: usize = 3;

/// Sample counts after each pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LodStats {
    /// Samples in the input track
    pub input: usize,
    /// Samples after temporal decimation
    pub after_decimation: usize,
    /// Samples after RDP (equal to `after_decimation` when RDP did not run)
    pub after_simplification: usize,
    /// Samples in the reduced track
    pub output: usize,
    /// Whether the cap removed the last sample that reached it
    pub cap_dropped_last: bool,
}

impl LodStats {
    /// Fraction of the input that was removed (0.0 for an empty input)
    pub fn reduction_ratio(&self) -> f64 {
        if self.input == 0 {
            return 0.0;
        }
        1.0 - self.output as f64 / self.input as f64
    }
}

/// Reduce `track` according to `config`
///
/// The result is sorted ascending by timestamp, holds at most
/// `config.max_points_per_track` samples, and is a subsequence of the time-sorted input.
///
/// # Errors
/// Returns [`crate::LodError::InvalidConfig`] if `config` fails validation.
///
/// # Example
/// ```
/// use time::{Duration, OffsetDateTime};
/// use track_lod::{LodConfig, Track, TrackPoint, apply_lod};
///
/// let start = OffsetDateTime::UNIX_EPOCH;
/// let track: Track = (0..1_000)
///     .map(|i| TrackPoint::new(start + Duration::seconds(i), 51.5, -0.1 + i as f64 * 1e-5))
///     .collect();
///
/// let config = LodConfig::new(50, 6.0, 5.0, true).unwrap();
/// let reduced = apply_lod(&track, &config).unwrap();
/// assert_eq!(reduced.len(), 2);
/// ```
pub fn apply_lod<P: Clone>(track: &Track<P>, config: &LodConfig) -> Result<Track<P>> {
    apply_lod_with_stats(track, config).map(|(reduced, _)| reduced)
}

/// Same as [`apply_lod`], also reporting per-stage sample counts
pub fn apply_lod_with_stats<P: Clone>(
    track: &Track<P>,
    config: &LodConfig,
) -> Result<(Track<P>, LodStats)> {
    #[cfg(feature = "profiling")]
    profiling::scope!("pipeline::apply_lod");

    config.validate()?;

    let mut samples: Vec<&TrackPoint<P>> = track.iter().collect();
    samples.sort_by_key(|p| p.timestamp);
    let input = samples.len();

    let decimated = decimate::decimate(samples, config.target_points_per_min);
    let after_decimation = decimated.len();

    let simplified = if config.use_rdp && decimated.len() > MIN_POINTS_FOR_RDP {
        simplify::simplify(decimated, config.rdp_epsilon_meters, config.projection)
    } else {
        decimated
    };
    let after_simplification = simplified.len();

    let last_before_cap = simplified.last().copied().map(std::ptr::from_ref);
    let capped = cap::cap(simplified, config.max_points_per_track);
    let cap_dropped_last = capped.last().copied().map(std::ptr::from_ref) != last_before_cap;

    let stats = LodStats {
        input,
        after_decimation,
        after_simplification,
        output: capped.len(),
        cap_dropped_last,
    };

    tracing::debug!(
        input = stats.input,
        after_decimation = stats.after_decimation,
        after_simplification = stats.after_simplification,
        output = stats.output,
        "Applied LOD reduction"
    );
    if cap_dropped_last {
        tracing::debug!(
            max_points = config.max_points_per_track,
            "Point cap dropped the final simplified sample"
        );
    }

    let reduced = capped.into_iter().cloned().collect();
    Ok((reduced, stats))
}
