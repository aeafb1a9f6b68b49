//! Hard cap on track length
//!
//! Applied last, after decimation and simplification. The size bound wins over endpoint
//! fidelity: the final sample kept by RDP may be dropped here.

/// Reduce `track` to at most `max_points` samples by uniform striding
///
/// Keeps `track[0], track[step], track[2 * step], ...` with
/// `step = max(1, len / max_points)`. Because the stride is floored, striding alone can
/// overshoot (300 samples at a cap of 40 give step 7 and 43 samples); the tail beyond
/// `max_points` is then cut off so the bound always holds.
pub fn cap<S>(track: Vec<S>, max_points: usize) -> Vec<S> {
    #[cfg(feature = "profiling")]
    profiling::scope!("cap::cap");

    if track.len() <= max_points {
        return track;
    }

    let step = (track.len() / max_points.max(1)).max(1);
    track.into_iter().step_by(step).take(max_points).collect()
}
