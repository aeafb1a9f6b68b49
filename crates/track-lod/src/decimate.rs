//! Temporal decimation
//!
//! Thins a track to roughly `per_minute` samples per minute of its duration by keeping
//! every `stride`-th sample. Shape is ignored; the RDP stage that follows re-anchors the
//! endpoints.

use crate::Sample;
use time::OffsetDateTime;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Decimate `track` to about `per_minute` samples per minute
///
/// The track is stably sorted by timestamp first. It is returned unchanged (but sorted)
/// when decimation is disabled, the track is too short, its span is under one second,
/// or the target would not shrink it. The last sample is not guaranteed to survive.
pub fn decimate<S: Sample>(mut track: Vec<S>, per_minute: f64) -> Vec<S> {
    #[cfg(feature = "profiling")]
    profiling::scope!("decimate::decimate");

    if per_minute <= 0.0 || track.len() < 2 {
        return track;
    }

    track.sort_by_key(|s| s.timestamp());

    let (first, last) = match (track.first(), track.last()) {
        (Some(first), Some(last)) => (first.timestamp(), last.timestamp()),
        _ => return track,
    };
    let total_seconds = whole_seconds(last) - whole_seconds(first);
    if total_seconds <= 0 {
        return track;
    }

    let target_total = (total_seconds as f64 / 60.0) * per_minute;
    if target_total <= 0.0 || target_total >= track.len() as f64 {
        return track;
    }

    let stride = ((track.len() as f64 / target_total).floor() as usize).max(1);
    track.into_iter().step_by(stride).collect()
}

/// Unix time floored to whole seconds
#[inline]
fn whole_seconds(timestamp: OffsetDateTime) -> i128 {
    timestamp.unix_timestamp_nanos().div_euclid(NANOS_PER_SECOND)
}
